//! Full report pipeline against the bundled ephemeris and a fixed calendar

use approx::assert_relative_eq;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use temporal_ephemeris::lunar::LunarDate;

use saju_core::formation::{DayStrength, FormationKind, Quality};
use saju_core::interactions::InteractionKind;
use saju_core::luck_cycle::LuckDirection;
use saju_core::scoring::IntensityLevel;
use saju_core::sinsal::SinsalKind;
use saju_core::*;

fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn reference_birth(gender: Gender) -> BirthInfo {
    BirthInfo::solar(ymd_hm(1990, 5, 15, 14, 30), "GMT+9", gender)
}

/// Always answers with the same pillars and puts the sectional terms a fixed
/// number of days either side of the birth.
struct FixedCalendar {
    year: GanZhi,
    month: GanZhi,
    day: GanZhi,
    days_to_next_term: i64,
    days_since_prev_term: i64,
}

impl FixedCalendar {
    fn reference() -> Self {
        FixedCalendar {
            year: GanZhi::new(Stem::Geng, Branch::Wu),
            month: GanZhi::new(Stem::Xin, Branch::Si),
            day: GanZhi::new(Stem::Geng, Branch::Chen),
            days_to_next_term: 21,
            days_since_prev_term: 9,
        }
    }
}

impl CalendarService for FixedCalendar {
    fn lunar_to_solar(&self, date: &LunarDate) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(date.year, date.month, date.day)
            .ok_or_else(|| SajuError::InvalidDate(date.to_string()))
    }

    fn exact_year_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Ok(self.year)
    }

    fn exact_month_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Ok(self.month)
    }

    fn exact_day_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Ok(self.day)
    }

    fn next_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>> {
        Ok(instant.utc() + Duration::days(self.days_to_next_term))
    }

    fn prev_solar_term(&self, instant: &SolarInstant) -> Result<DateTime<Utc>> {
        Ok(instant.utc() - Duration::days(self.days_since_prev_term))
    }
}

struct UnavailableCalendar;

impl CalendarService for UnavailableCalendar {
    fn lunar_to_solar(&self, _date: &LunarDate) -> Result<NaiveDate> {
        Err(SajuError::CalendarService("offline".to_string()))
    }

    fn exact_year_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Err(SajuError::CalendarService("offline".to_string()))
    }

    fn exact_month_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Err(SajuError::CalendarService("offline".to_string()))
    }

    fn exact_day_ganzhi(&self, _instant: &SolarInstant) -> Result<GanZhi> {
        Err(SajuError::CalendarService("offline".to_string()))
    }

    fn next_solar_term(&self, _instant: &SolarInstant) -> Result<DateTime<Utc>> {
        Err(SajuError::CalendarService("offline".to_string()))
    }

    fn prev_solar_term(&self, _instant: &SolarInstant) -> Result<DateTime<Utc>> {
        Err(SajuError::CalendarService("offline".to_string()))
    }
}

#[test]
fn test_reference_report_with_ephemeris() {
    let report = reference_birth(Gender::Male).generate_report(Some(2026)).unwrap();

    assert_eq!(report.chart.to_string(), "庚午 辛巳 庚辰 癸未");
    assert_eq!(report.chart.day_master(), Stem::Geng);

    // Only 午未 relate among the four branches
    assert_eq!(report.interactions.len(), 1);
    let combination = &report.interactions[0];
    assert_eq!(combination.kind, InteractionKind::Combination);
    assert_eq!(combination.result_element, Some(Element::Fire));
    assert_eq!(
        combination.positions,
        Some((PillarPosition::Year, PillarPosition::Hour))
    );

    let kinds: Vec<SinsalKind> = report.sinsal.iter().map(|s| s.kind).collect();
    assert!(kinds.contains(&SinsalKind::HeavenlyNoble));
    assert!(kinds.contains(&SinsalKind::Canopy));

    let formation = report.formation.formation().unwrap();
    assert_eq!(formation.kind, FormationKind::SevenKillings);
    assert_eq!(formation.quality, Quality::Medium);
    assert_eq!(formation.day_strength, DayStrength::Balanced);
    assert!(!formation.transparent);

    assert_eq!(report.luck_cycle.direction, LuckDirection::Forward);
    assert_eq!(report.luck_cycle.start_age, 7);
    assert_eq!(report.luck_cycle.entries.len(), 10);
    assert_eq!(report.luck_cycle.entries[0].ganzhi().to_string(), "壬午");

    let score = report.event_score.as_ref().unwrap();
    assert_eq!(score.year_pillar.unwrap().to_string(), "丙午");
    assert_relative_eq!(score.natal_score, 38.5, epsilon = 1e-9);
    assert_relative_eq!(score.total, 8.5, epsilon = 1e-9);
    assert_eq!(score.intensity.level, IntensityLevel::Low);
    assert_eq!(score.intensity.label, "Neutral");
    assert_eq!(score.explanation.last().unwrap(), "--- Final: +8.5 (Neutral)");
}

#[test]
fn test_female_reference_runs_backward() {
    let report = reference_birth(Gender::Female).generate_report(None).unwrap();
    assert_eq!(report.luck_cycle.direction, LuckDirection::Backward);
    assert_eq!(report.luck_cycle.start_age, 3);
    assert_eq!(report.luck_cycle.entries[0].ganzhi().to_string(), "庚辰");
    assert!(report.event_score.is_none());
}

#[test]
fn test_start_of_spring_changes_year_pillar() {
    let before = BirthInfo::solar(ymd_hm(1990, 2, 3, 12, 0), "GMT+9", Gender::Male)
        .generate_report(None)
        .unwrap();
    let after = BirthInfo::solar(ymd_hm(1990, 2, 5, 12, 0), "GMT+9", Gender::Male)
        .generate_report(None)
        .unwrap();
    assert_eq!(before.chart.year.ganzhi().to_string(), "己巳");
    assert_eq!(after.chart.year.ganzhi().to_string(), "庚午");
    // A yin year sends a male chart backward
    assert_eq!(before.luck_cycle.direction, LuckDirection::Backward);
    assert_eq!(after.luck_cycle.direction, LuckDirection::Forward);
}

#[test]
fn test_late_evening_birth_uses_next_day() {
    let report = BirthInfo::solar(ymd_hm(1990, 5, 15, 23, 10), "GMT+9", Gender::Male)
        .generate_report(None)
        .unwrap();
    assert_eq!(report.chart.day.ganzhi().to_string(), "辛巳");
    assert_eq!(report.chart.hour.ganzhi().to_string(), "戊子");
}

#[test]
fn test_lunar_birth_matches_solar_birth() {
    let time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
    let lunar = BirthInfo::lunar(1990, 4, 21, false, time, "GMT+9", Gender::Male)
        .generate_report(Some(2026))
        .unwrap();
    let solar = reference_birth(Gender::Male).generate_report(Some(2026)).unwrap();

    assert_eq!(lunar.solar_instant, solar.solar_instant);
    assert_eq!(lunar.chart, solar.chart);
    assert_eq!(lunar.event_score, solar.event_score);
}

#[test]
fn test_fixed_calendar_pipeline() {
    let engine = SajuEngine::new(FixedCalendar::reference(), EngineConfig::default());

    let male = Report::calculate(&reference_birth(Gender::Male), &engine, Some(2026)).unwrap();
    assert_eq!(male.chart.to_string(), "庚午 辛巳 庚辰 癸未");
    assert_eq!(male.luck_cycle.days_to_term, 21.0);
    assert_eq!(male.luck_cycle.start_age, 7);
    assert_relative_eq!(male.event_score.unwrap().total, 8.5, epsilon = 1e-9);

    let female = Report::calculate(&reference_birth(Gender::Female), &engine, None).unwrap();
    assert_eq!(female.luck_cycle.days_to_term, 9.0);
    assert_eq!(female.luck_cycle.start_age, 3);
}

#[test]
fn test_calendar_failure_propagates() {
    let engine = SajuEngine::new(UnavailableCalendar, EngineConfig::default());
    let result = Report::calculate(&reference_birth(Gender::Male), &engine, None);
    assert!(matches!(result, Err(SajuError::CalendarService(_))));
}

#[test]
fn test_invalid_input_is_rejected() {
    let mut birth = reference_birth(Gender::Male);
    birth.month = 13;
    assert!(matches!(
        birth.generate_report(None),
        Err(SajuError::InvalidDate(_))
    ));
}

#[test]
fn test_reports_are_idempotent() {
    let first = reference_birth(Gender::Male).generate_report(Some(2026)).unwrap();
    let second = reference_birth(Gender::Male).generate_report(Some(2026)).unwrap();
    assert_eq!(first, second);

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn test_config_file_changes_cycle_count() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "luck_cycle_count = 4").unwrap();
    let config = EngineConfig::from_path(file.path()).unwrap();

    let engine = SajuEngine::new(EphemerisCalendar, config);
    let report = Report::calculate(&reference_birth(Gender::Male), &engine, None).unwrap();
    assert_eq!(report.luck_cycle.entries.len(), 4);
}
