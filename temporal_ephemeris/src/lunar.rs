use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{
    date_from_day_number, day_number, find_sun_longitude, lunation_number, new_moon,
    sun_longitude, CalculationError, ERR_INVALID_LUNAR_DATE, ERR_OUT_OF_RANGE,
};

/// Civil calendar offset the lunisolar month boundaries are reckoned in (UTC+8).
pub const REFERENCE_OFFSET_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap_month: bool,
}

impl LunarDate {
    pub fn new(year: i32, month: u32, day: u32, is_leap_month: bool) -> Self {
        LunarDate {
            year,
            month,
            day,
            is_leap_month,
        }
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leap = if self.is_leap_month { "leap " } else { "" };
        write!(f, "{:04}/{}{:02}/{:02}", self.year, leap, self.month, self.day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarMonth {
    pub year: i32,
    pub month: u32,
    pub is_leap: bool,
    pub first_day: NaiveDate,
    pub days: u32,
}

impl LunarMonth {
    fn contains(&self, date: NaiveDate) -> bool {
        let offset = (date - self.first_day).num_days();
        (0..i64::from(self.days)).contains(&offset)
    }
}

fn civil_day(jd: f64) -> i64 {
    (jd + 0.5 + REFERENCE_OFFSET_HOURS / 24.0).floor() as i64
}

fn new_moon_on_or_before(jd: f64) -> i64 {
    let target = civil_day(jd);
    let mut k = lunation_number(jd) + 1;
    while civil_day(new_moon(k)) > target {
        k -= 1;
    }
    while civil_day(new_moon(k + 1)) <= target {
        k += 1;
    }
    k
}

fn winter_solstice(year: i32) -> Result<f64, CalculationError> {
    let guess = NaiveDate::from_ymd_opt(year, 12, 21).ok_or_else(|| {
        CalculationError::new(ERR_OUT_OF_RANGE, format!("year {} is out of range", year))
    })?;
    find_sun_longitude(day_number(guess) as f64 - 0.5, 270.0)
}

// Index of the principal term in force at the start of a civil day.
fn principal_term_index(day: i64) -> i64 {
    let jd = day as f64 - 0.5 - REFERENCE_OFFSET_HOURS / 24.0;
    (sun_longitude(jd) / 30.0).floor() as i64
}

/// Lunar months from the one containing the winter solstice of `year`
/// (month 11) up to, excluding, the one containing the next solstice.
pub fn months_from_solstice(year: i32) -> Result<Vec<LunarMonth>, CalculationError> {
    let first = new_moon_on_or_before(winter_solstice(year)?);
    let last = new_moon_on_or_before(winter_solstice(year + 1)?);
    let count = (last - first) as usize;

    let starts: Vec<i64> = (0..=count as i64)
        .map(|i| civil_day(new_moon(first + i)))
        .collect();

    // A 13-month span has one month without a principal term; the first such month is leap.
    let leap_index = if count == 13 {
        (0..count).find(|&i| principal_term_index(starts[i]) == principal_term_index(starts[i + 1]))
    } else {
        None
    };

    let mut months = Vec::with_capacity(count);
    let mut number = 11;
    let mut lunar_year = year;
    for i in 0..count {
        let is_leap = leap_index == Some(i);
        if i > 0 && !is_leap {
            number = number % 12 + 1;
            if number == 1 {
                lunar_year = year + 1;
            }
        }
        let first_day = date_from_day_number(starts[i]).ok_or_else(|| {
            CalculationError::new(ERR_OUT_OF_RANGE, format!("day {} is out of range", starts[i]))
        })?;
        months.push(LunarMonth {
            year: lunar_year,
            month: number,
            is_leap,
            first_day,
            days: (starts[i + 1] - starts[i]) as u32,
        });
    }
    Ok(months)
}

fn months_around(year: i32) -> Result<Vec<LunarMonth>, CalculationError> {
    let mut months = months_from_solstice(year - 1)?;
    months.extend(months_from_solstice(year)?);
    Ok(months)
}

pub fn lunar_to_solar(date: &LunarDate) -> Result<NaiveDate, CalculationError> {
    let month = months_around(date.year)?
        .into_iter()
        .find(|m| m.year == date.year && m.month == date.month && m.is_leap == date.is_leap_month)
        .ok_or_else(|| {
            CalculationError::new(
                ERR_INVALID_LUNAR_DATE,
                format!("lunar month {} does not exist", date),
            )
        })?;

    if date.day == 0 || date.day > month.days {
        return Err(CalculationError::new(
            ERR_INVALID_LUNAR_DATE,
            format!("lunar date {} exceeds a {}-day month", date, month.days),
        ));
    }
    Ok(month.first_day + chrono::Duration::days(i64::from(date.day - 1)))
}

pub fn solar_to_lunar(date: NaiveDate) -> Result<LunarDate, CalculationError> {
    let year = chrono::Datelike::year(&date);
    months_around(year)?
        .into_iter()
        .find(|m| m.contains(date))
        .map(|m| LunarDate {
            year: m.year,
            month: m.month,
            day: (date - m.first_day).num_days() as u32 + 1,
            is_leap_month: m.is_leap,
        })
        .ok_or_else(|| {
            CalculationError::new(ERR_OUT_OF_RANGE, format!("no lunar month covers {}", date))
        })
}
