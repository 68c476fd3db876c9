use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{
    day_number, find_sun_longitude, revjul, sun_longitude, CalculationError, ERR_OUT_OF_RANGE,
    TROPICAL_YEAR_DAYS,
};

/// The 24 solar terms, starting from Start of Spring (315°) in 15° steps.
/// Even indices are the sectional terms that open a solar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolarTerm {
    StartOfSpring,
    RainWater,
    AwakeningOfInsects,
    SpringEquinox,
    PureBrightness,
    GrainRain,
    StartOfSummer,
    GrainBuds,
    GrainInEar,
    SummerSolstice,
    MinorHeat,
    MajorHeat,
    StartOfAutumn,
    EndOfHeat,
    WhiteDew,
    AutumnEquinox,
    ColdDew,
    FrostDescent,
    StartOfWinter,
    MinorSnow,
    MajorSnow,
    WinterSolstice,
    MinorCold,
    MajorCold,
}

impl SolarTerm {
    pub const ALL: [SolarTerm; 24] = [
        SolarTerm::StartOfSpring,
        SolarTerm::RainWater,
        SolarTerm::AwakeningOfInsects,
        SolarTerm::SpringEquinox,
        SolarTerm::PureBrightness,
        SolarTerm::GrainRain,
        SolarTerm::StartOfSummer,
        SolarTerm::GrainBuds,
        SolarTerm::GrainInEar,
        SolarTerm::SummerSolstice,
        SolarTerm::MinorHeat,
        SolarTerm::MajorHeat,
        SolarTerm::StartOfAutumn,
        SolarTerm::EndOfHeat,
        SolarTerm::WhiteDew,
        SolarTerm::AutumnEquinox,
        SolarTerm::ColdDew,
        SolarTerm::FrostDescent,
        SolarTerm::StartOfWinter,
        SolarTerm::MinorSnow,
        SolarTerm::MajorSnow,
        SolarTerm::WinterSolstice,
        SolarTerm::MinorCold,
        SolarTerm::MajorCold,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> SolarTerm {
        SolarTerm::ALL[index % 24]
    }

    /// Ecliptic longitude of the Sun at this term, in degrees.
    pub fn longitude(self) -> f64 {
        (315.0 + 15.0 * self.index() as f64).rem_euclid(360.0)
    }

    /// The most recent term reached at the given solar longitude.
    pub fn from_longitude(longitude: f64) -> SolarTerm {
        let offset = (longitude - 315.0).rem_euclid(360.0);
        SolarTerm::from_index((offset / 15.0).floor() as usize)
    }

    pub fn is_sectional(self) -> bool {
        self.index() % 2 == 0
    }

    pub fn hanzi(self) -> &'static str {
        const NAMES: [&str; 24] = [
            "立春", "雨水", "驚蟄", "春分", "清明", "穀雨", "立夏", "小滿", "芒種", "夏至", "小暑",
            "大暑", "立秋", "處暑", "白露", "秋分", "寒露", "霜降", "立冬", "小雪", "大雪", "冬至",
            "小寒", "大寒",
        ];
        NAMES[self.index()]
    }
}

impl fmt::Display for SolarTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hanzi())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermCrossing {
    pub term: SolarTerm,
    /// Julian Day (UT) of the crossing.
    pub jd: f64,
}

impl TermCrossing {
    pub fn instant(&self) -> Result<DateTime<Utc>, CalculationError> {
        revjul(self.jd)
    }
}

fn crossing(jd_guess: f64, longitude: f64) -> Result<TermCrossing, CalculationError> {
    let jd = find_sun_longitude(jd_guess, longitude)?;
    Ok(TermCrossing {
        term: SolarTerm::from_longitude(longitude + 1e-6),
        jd,
    })
}

// Sectional terms sit at longitudes congruent to 15 modulo 30.
fn sectional_floor(longitude: f64) -> f64 {
    15.0 + 30.0 * ((longitude - 15.0) / 30.0).floor()
}

/// First sectional term crossing strictly after `jd`.
pub fn next_sectional_term(jd: f64) -> Result<TermCrossing, CalculationError> {
    let longitude = sun_longitude(jd);
    let target = sectional_floor(longitude) + 30.0;
    let guess = jd + (target - longitude) * TROPICAL_YEAR_DAYS / 360.0;
    crossing(guess, target.rem_euclid(360.0))
}

/// Last sectional term crossing at or before `jd`.
pub fn previous_sectional_term(jd: f64) -> Result<TermCrossing, CalculationError> {
    let longitude = sun_longitude(jd);
    let target = sectional_floor(longitude);
    let guess = jd - (longitude - target) * TROPICAL_YEAR_DAYS / 360.0;
    crossing(guess, target.rem_euclid(360.0))
}

/// Crossing of `term` within Gregorian `year`.
pub fn term_in_year(year: i32, term: SolarTerm) -> Result<TermCrossing, CalculationError> {
    let new_year = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        CalculationError::new(ERR_OUT_OF_RANGE, format!("year {} is out of range", year))
    })?;
    // Day-of-year estimate from the March equinox near day 79.
    let day_of_year =
        (79.0 + term.longitude() * TROPICAL_YEAR_DAYS / 360.0).rem_euclid(TROPICAL_YEAR_DAYS);
    let guess = day_number(new_year) as f64 - 0.5 + day_of_year;
    crossing(guess, term.longitude())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::julday;
    use chrono::TimeZone;

    fn minutes_apart(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
        (a - b).num_minutes().abs()
    }

    #[test]
    fn test_term_longitudes() {
        assert_eq!(SolarTerm::StartOfSpring.longitude(), 315.0);
        assert_eq!(SolarTerm::SpringEquinox.longitude(), 0.0);
        assert_eq!(SolarTerm::WinterSolstice.longitude(), 270.0);
        assert_eq!(SolarTerm::from_longitude(54.1), SolarTerm::StartOfSummer);
        assert_eq!(SolarTerm::from_longitude(314.9), SolarTerm::MajorCold);
        let sectional: Vec<_> = SolarTerm::ALL.iter().filter(|t| t.is_sectional()).collect();
        assert_eq!(sectional.len(), 12);
        assert!(sectional.iter().all(|t| (t.longitude() - 15.0).rem_euclid(30.0) == 0.0));
    }

    #[test]
    fn test_start_of_spring_1990() {
        // 1990-02-04 10:14 CST
        let crossing = term_in_year(1990, SolarTerm::StartOfSpring).unwrap();
        let expected = Utc.with_ymd_and_hms(1990, 2, 4, 2, 14, 0).unwrap();
        assert!(minutes_apart(crossing.instant().unwrap(), expected) <= 10);
        assert_eq!(crossing.term, SolarTerm::StartOfSpring);
    }

    #[test]
    fn test_winter_solstice_2020() {
        let crossing = term_in_year(2020, SolarTerm::WinterSolstice).unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 12, 21, 10, 2, 0).unwrap();
        assert!(minutes_apart(crossing.instant().unwrap(), expected) <= 10);
    }

    #[test]
    fn test_sectional_neighbours() {
        let birth = julday(&Utc.with_ymd_and_hms(1990, 5, 15, 5, 30, 0).unwrap());

        let next = next_sectional_term(birth).unwrap();
        assert_eq!(next.term, SolarTerm::GrainInEar);
        let expected_next = Utc.with_ymd_and_hms(1990, 6, 5, 22, 46, 0).unwrap();
        assert!(minutes_apart(next.instant().unwrap(), expected_next) <= 10);

        let previous = previous_sectional_term(birth).unwrap();
        assert_eq!(previous.term, SolarTerm::StartOfSummer);
        let expected_previous = Utc.with_ymd_and_hms(1990, 5, 5, 18, 35, 0).unwrap();
        assert!(minutes_apart(previous.instant().unwrap(), expected_previous) <= 10);
    }

    #[test]
    fn test_sectional_wraps_at_spring_equinox() {
        // Late March sits between Awakening of Insects (345°) and Pure Brightness (15°).
        let jd = julday(&Utc.with_ymd_and_hms(2021, 3, 25, 0, 0, 0).unwrap());
        assert_eq!(previous_sectional_term(jd).unwrap().term, SolarTerm::AwakeningOfInsects);
        assert_eq!(next_sectional_term(jd).unwrap().term, SolarTerm::PureBrightness);
    }
}
