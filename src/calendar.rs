use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use temporal_ephemeris::core::{day_number, julday, sun_longitude};
use temporal_ephemeris::lunar::{self, LunarDate};
use temporal_ephemeris::terms::{next_sectional_term, previous_sectional_term};
use tracing::{debug, warn};

use super::*;
use crate::config::OffsetPolicy;

const DAY_ROLLOVER_HOUR: u32 = 23;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

// ---------------------------
// ## Solar instant
// ---------------------------

/// A birth moment on the solar calendar: local civil time plus its UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarInstant {
    local: NaiveDateTime,
    offset_minutes: i32,
}

impl SolarInstant {
    pub fn new(local: NaiveDateTime, offset_minutes: i32) -> Self {
        SolarInstant {
            local,
            offset_minutes,
        }
    }

    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    pub fn utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&(self.local - Duration::minutes(i64::from(self.offset_minutes))))
    }
}

// ---------------------------
// ## Calendar collaborator
// ---------------------------

/// Astronomical calendar the pillar and luck-cycle calculations delegate to.
///
/// Implementations must be deterministic: the same instant always yields the
/// same pairs and term crossings.
pub trait CalendarService {
    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate>;

    /// Year pair, switching at Start of Spring.
    fn exact_year_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi>;

    /// Month pair, switching at each sectional solar term.
    fn exact_month_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi>;

    /// Day pair, switching at local 23:00.
    fn exact_day_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi>;

    fn hour_ganzhi(&self, instant: &SolarInstant, day_stem: Stem) -> Result<GanZhi> {
        Ok(hour_ganzhi(instant.local().hour(), day_stem))
    }

    /// First sectional term crossing after the instant.
    fn next_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>>;

    /// Last sectional term crossing at or before the instant.
    fn prev_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>>;

    /// Continuous day count (Julian Day) used for day differences.
    fn continuous_day_count(&self, instant: &DateTime<Utc>) -> f64 {
        julday(instant)
    }
}

/// Branch of the two-hour period containing `hour`; 子 spans 23:00 to 00:59.
pub fn hour_branch(hour: u32) -> Branch {
    Branch::from_index(((hour + 1) / 2) as usize)
}

/// Hour pair: the 子 hour of a 甲 or 己 day is 甲子, and so on in steps of two stems.
pub fn hour_ganzhi(hour: u32, day_stem: Stem) -> GanZhi {
    let branch = hour_branch(hour);
    let stem = Stem::from_index((day_stem.index() % 5) * 2 + branch.index());
    GanZhi::new(stem, branch)
}

/// Day pair of a civil date (2000-01-01 is 戊午).
pub fn day_ganzhi(date: NaiveDate) -> GanZhi {
    GanZhi::from_cycle_index(day_number(date) + 49)
}

/// Civil date whose day pair applies at `local`, rolled forward from 23:00.
pub fn sexagenary_date(local: NaiveDateTime) -> NaiveDate {
    if local.hour() >= DAY_ROLLOVER_HOUR {
        local.date() + Duration::days(1)
    } else {
        local.date()
    }
}

/// Solar month number counted from the 寅 month (0) at Start of Spring.
pub fn solar_month_index(longitude: f64) -> usize {
    let offset = (longitude - 315.0).rem_euclid(360.0);
    ((offset / 30.0).floor() as usize).min(11)
}

/// Month pair from the year stem: a 甲 or 己 year opens with 丙寅.
pub fn month_ganzhi(year_stem: Stem, month_index: usize) -> GanZhi {
    GanZhi::new(
        Stem::from_index(year_stem.index() * 2 + 2 + month_index),
        Branch::from_index(month_index + 2),
    )
}

/// Calendar backed by the bundled ephemeris routines.
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemerisCalendar;

impl EphemerisCalendar {
    // Sexagenary year and solar month index, both read off the same solar longitude.
    fn solar_position(&self, instant: &SolarInstant) -> (i32, usize) {
        let utc = instant.utc();
        let month = solar_month_index(sun_longitude(julday(&utc)));
        // 子 and 丑 months in January belong to the previous sexagenary year.
        let year = if utc.month() <= 2 && month >= 10 {
            utc.year() - 1
        } else {
            utc.year()
        };
        (year, month)
    }
}

impl CalendarService for EphemerisCalendar {
    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate> {
        Ok(lunar::lunar_to_solar(date)?)
    }

    fn exact_year_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi> {
        let (year, _) = self.solar_position(instant);
        Ok(GanZhi::of_year(year))
    }

    fn exact_month_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi> {
        let (year, month) = self.solar_position(instant);
        Ok(month_ganzhi(GanZhi::of_year(year).stem, month))
    }

    fn exact_day_ganzhi(&self, instant: &SolarInstant) -> Result<GanZhi> {
        Ok(day_ganzhi(sexagenary_date(instant.local())))
    }

    fn next_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>> {
        let crossing = next_sectional_term(julday(&instant.utc()))?;
        debug!(term = %crossing.term, "next sectional term");
        Ok(crossing.instant()?)
    }

    fn prev_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>> {
        let crossing = previous_sectional_term(julday(&instant.utc()))?;
        debug!(term = %crossing.term, "previous sectional term");
        Ok(crossing.instant()?)
    }
}

// ---------------------------
// ## Offsets
// ---------------------------

/// Parses `GMT`, `UTC`, `GMT+9`, `GMT-5`, `GMT+5:30` and similar into minutes east of UTC.
pub fn parse_gmt_offset(timezone: &str) -> Option<i32> {
    let normalized = timezone.trim().to_ascii_uppercase();
    let rest = normalized
        .strip_prefix("GMT")
        .or_else(|| normalized.strip_prefix("UTC"))?;
    if rest.is_empty() {
        return Some(0);
    }

    let (sign, digits) = if let Some(digits) = rest.strip_prefix('+') {
        (1, digits)
    } else if let Some(digits) = rest.strip_prefix('-') {
        (-1, digits)
    } else {
        return None;
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((hours, minutes)) => (hours, Some(minutes)),
        None => (digits, None),
    };
    let is_number = |s: &str, max_len: usize| {
        !s.is_empty() && s.len() <= max_len && s.bytes().all(|b| b.is_ascii_digit())
    };

    if !is_number(hours, 2) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = match minutes {
        Some(m) if m.len() == 2 && is_number(m, 2) => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };

    let total = hours * 60 + minutes;
    if minutes >= 60 || total > MAX_OFFSET_MINUTES {
        return None;
    }
    Some(sign * total)
}

fn resolve_offset(timezone: &str, config: &EngineConfig) -> Result<i32> {
    match parse_gmt_offset(timezone) {
        Some(minutes) => Ok(minutes),
        None => match config.offset_policy {
            OffsetPolicy::Strict => Err(SajuError::InvalidDate(format!(
                "unrecognized UTC offset {:?}",
                timezone
            ))),
            OffsetPolicy::Lenient => {
                warn!(
                    timezone,
                    fallback_hours = config.fallback_offset_hours,
                    "unrecognized UTC offset, using fallback"
                );
                Ok(config.fallback_offset_hours * 60)
            }
        },
    }
}

fn check_year(year: i32, config: &EngineConfig) -> Result<()> {
    if (config.min_year..=config.max_year).contains(&year) {
        Ok(())
    } else {
        Err(SajuError::InvalidDate(format!(
            "year {} is outside the supported range {}..={}",
            year, config.min_year, config.max_year
        )))
    }
}

// ---------------------------
// ## Resolver
// ---------------------------

impl<C: CalendarService> SajuEngine<C> {
    /// Turns the civil (or lunar) birth data into a solar instant.
    pub fn resolve_birth_instant(&self, birth_info: &BirthInfo) -> Result<SolarInstant> {
        let config = self.config();
        check_year(birth_info.year, config)?;
        let offset_minutes = resolve_offset(&birth_info.timezone, config)?;

        let date = match birth_info.calendar {
            CalendarKind::Solar => {
                NaiveDate::from_ymd_opt(birth_info.year, birth_info.month, birth_info.day)
                    .ok_or_else(|| {
                        SajuError::InvalidDate(format!(
                            "{}-{:02}-{:02} is not a calendar date",
                            birth_info.year, birth_info.month, birth_info.day
                        ))
                    })?
            }
            CalendarKind::Lunar { is_leap_month } => {
                let lunar_date = LunarDate::new(
                    birth_info.year,
                    birth_info.month,
                    birth_info.day,
                    is_leap_month,
                );
                let solar = self.calendar().lunar_to_solar(&lunar_date)?;
                debug!(lunar = %lunar_date, solar = %solar, "converted lunar birth date");
                solar
            }
        };
        check_year(date.year(), config)?;

        let instant = SolarInstant::new(date.and_time(birth_info.time), offset_minutes);
        debug!(local = %instant.local(), utc = %instant.utc(), "birth instant resolved");
        Ok(instant)
    }
}
