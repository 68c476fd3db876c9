use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;

pub const J2000: f64 = 2_451_545.0;
pub const TROPICAL_YEAR_DAYS: f64 = 365.2422;
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_861;

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
// JDN of 0001-01-01 minus one, so that `num_days_from_ce` maps straight onto day numbers.
const CE_DAY_OFFSET: i64 = 1_721_425;

const MAX_ITERATIONS: usize = 30;
const LONGITUDE_TOLERANCE_DEG: f64 = 1e-7;

pub const ERR_NO_CONVERGENCE: i32 = -1;
pub const ERR_OUT_OF_RANGE: i32 = -2;
pub const ERR_INVALID_LUNAR_DATE: i32 = -3;

#[derive(Debug, Clone, PartialEq)]
pub struct CalculationError {
    pub code: i32,
    pub msg: String,
}

impl CalculationError {
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        CalculationError {
            code,
            msg: msg.into(),
        }
    }
}

impl fmt::Display for CalculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalculationError {{ code: {} message: {} }}",
            self.code, self.msg
        )
    }
}

impl std::error::Error for CalculationError {}

// ---------------------------
// ## Time scales
// ---------------------------

/// Julian Day (UT) of a UTC instant, millisecond precision.
pub fn julday(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD
}

/// Inverse of [`julday`].
pub fn revjul(jd: f64) -> Result<DateTime<Utc>, CalculationError> {
    if !jd.is_finite() {
        return Err(CalculationError::new(
            ERR_OUT_OF_RANGE,
            format!("julian day {} is not finite", jd),
        ));
    }
    let millis = ((jd - UNIX_EPOCH_JD) * MILLIS_PER_DAY).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        CalculationError::new(
            ERR_OUT_OF_RANGE,
            format!("julian day {} is outside the supported range", jd),
        )
    })
}

/// Julian Day Number of a civil date (the integer day starting at that date's noon).
pub fn day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + CE_DAY_OFFSET
}

pub fn date_from_day_number(day: i64) -> Option<NaiveDate> {
    let days = i32::try_from(day - CE_DAY_OFFSET).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

fn decimal_year(jd: f64) -> f64 {
    2000.0 + (jd - J2000) / 365.25
}

/// ΔT = TT − UT in seconds (Espenak & Meeus polynomial fits).
pub fn delta_t(year: f64) -> f64 {
    if (1900.0..1920.0).contains(&year) {
        let t = year - 1900.0;
        -2.79 + 1.494119 * t - 0.0598939 * t.powi(2) + 0.0061966 * t.powi(3) - 0.000197 * t.powi(4)
    } else if (1920.0..1941.0).contains(&year) {
        let t = year - 1920.0;
        21.20 + 0.84493 * t - 0.076100 * t.powi(2) + 0.0020936 * t.powi(3)
    } else if (1941.0..1961.0).contains(&year) {
        let t = year - 1950.0;
        29.07 + 0.407 * t - t.powi(2) / 233.0 + t.powi(3) / 2547.0
    } else if (1961.0..1986.0).contains(&year) {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t.powi(2) / 260.0 - t.powi(3) / 718.0
    } else if (1986.0..2005.0).contains(&year) {
        let t = year - 2000.0;
        63.86 + 0.3345 * t - 0.060374 * t.powi(2)
            + 0.0017275 * t.powi(3)
            + 0.000651814 * t.powi(4)
            + 0.00002373599 * t.powi(5)
    } else if (2005.0..2050.0).contains(&year) {
        let t = year - 2000.0;
        62.92 + 0.32217 * t + 0.005589 * t.powi(2)
    } else if (2050.0..2150.0).contains(&year) {
        -20.0 + 32.0 * ((year - 1820.0) / 100.0).powi(2) - 0.5628 * (2150.0 - year)
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    }
}

// ---------------------------
// ## Sun
// ---------------------------

/// Apparent geocentric ecliptic longitude of the Sun in degrees, [0, 360).
pub fn sun_longitude(jd_ut: f64) -> f64 {
    let jde = jd_ut + delta_t(decimal_year(jd_ut)) / SECONDS_PER_DAY;
    let t = (jde - J2000) / 36525.0;

    let mean_longitude = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let mean_anomaly = (357.52911 + 35999.05029 * t - 0.0001537 * t * t).to_radians();
    let center = (1.914602 - 0.004817 * t - 0.000014 * t * t) * mean_anomaly.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * mean_anomaly).sin()
        + 0.000289 * (3.0 * mean_anomaly).sin();
    let omega = (125.04 - 1934.136 * t).to_radians();

    (mean_longitude + center - 0.00569 - 0.00478 * omega.sin()).rem_euclid(360.0)
}

fn wrap_180(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Refines `jd_guess` to the instant the Sun reaches `target_deg`.
/// Converges to the crossing closest to the guess.
pub fn find_sun_longitude(jd_guess: f64, target_deg: f64) -> Result<f64, CalculationError> {
    let mut jd = jd_guess;
    for _ in 0..MAX_ITERATIONS {
        let delta = wrap_180(target_deg - sun_longitude(jd));
        jd += delta * TROPICAL_YEAR_DAYS / 360.0;
        if delta.abs() < LONGITUDE_TOLERANCE_DEG {
            return Ok(jd);
        }
    }
    Err(CalculationError::new(
        ERR_NO_CONVERGENCE,
        format!(
            "solar longitude {} did not converge near JD {}",
            target_deg, jd_guess
        ),
    ))
}

// ---------------------------
// ## Moon
// ---------------------------

const NEW_MOON_EPOCH_JDE: f64 = 2_451_550.097_66;

/// Approximate lunation number of the new moon preceding `jd`.
pub fn lunation_number(jd: f64) -> i64 {
    ((jd - NEW_MOON_EPOCH_JDE) / SYNODIC_MONTH_DAYS).floor() as i64
}

/// Instant (JD, UT) of true new moon number `k`, counted from 2000-01-06.
pub fn new_moon(k: i64) -> f64 {
    let k = k as f64;
    let t = k / 1236.85;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mut jde = NEW_MOON_EPOCH_JDE + SYNODIC_MONTH_DAYS * k + 0.00015437 * t2
        - 0.000000150 * t3
        + 0.00000000073 * t4;

    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let m = (2.5534 + 29.10535670 * k - 0.0000014 * t2 - 0.00000011 * t3).to_radians();
    let mp = (201.5643 + 385.81693528 * k + 0.0107582 * t2 + 0.00001238 * t3
        - 0.000000058 * t4)
        .to_radians();
    let f = (160.7108 + 390.67050284 * k - 0.0016118 * t2 - 0.00000227 * t3
        + 0.000000011 * t4)
        .to_radians();
    let omega = (124.7746 - 1.56375588 * k + 0.0020672 * t2 + 0.00000215 * t3).to_radians();

    let periodic = -0.40720 * mp.sin()
        + 0.17241 * e * m.sin()
        + 0.01608 * (2.0 * mp).sin()
        + 0.01039 * (2.0 * f).sin()
        + 0.00739 * e * (mp - m).sin()
        - 0.00514 * e * (mp + m).sin()
        + 0.00208 * e * e * (2.0 * m).sin()
        - 0.00111 * (mp - 2.0 * f).sin()
        - 0.00057 * (mp + 2.0 * f).sin()
        + 0.00056 * e * (2.0 * mp + m).sin()
        - 0.00042 * (3.0 * mp).sin()
        + 0.00042 * e * (m + 2.0 * f).sin()
        + 0.00038 * e * (m - 2.0 * f).sin()
        - 0.00024 * e * (2.0 * mp - m).sin()
        - 0.00017 * omega.sin()
        - 0.00007 * (mp + 2.0 * m).sin()
        + 0.00004 * (2.0 * mp - 2.0 * f).sin()
        + 0.00004 * (3.0 * m).sin()
        + 0.00003 * (mp + m - 2.0 * f).sin()
        + 0.00003 * (2.0 * mp + 2.0 * f).sin()
        - 0.00003 * (mp + m + 2.0 * f).sin()
        + 0.00003 * (mp - m + 2.0 * f).sin()
        - 0.00002 * (mp - m - 2.0 * f).sin()
        - 0.00002 * (3.0 * mp + m).sin()
        + 0.00002 * (4.0 * mp).sin();

    // planetary arguments A1..A14
    let planetary: [(f64, f64); 14] = [
        (299.77 + 0.107408 * k - 0.009173 * t2, 0.000325),
        (251.88 + 0.016321 * k, 0.000165),
        (251.83 + 26.651886 * k, 0.000164),
        (349.42 + 36.412478 * k, 0.000126),
        (84.66 + 18.206239 * k, 0.000110),
        (141.74 + 53.303771 * k, 0.000062),
        (207.14 + 2.453732 * k, 0.000060),
        (154.84 + 7.306860 * k, 0.000056),
        (34.52 + 27.261239 * k, 0.000047),
        (207.19 + 0.121824 * k, 0.000042),
        (291.34 + 1.844379 * k, 0.000040),
        (161.72 + 24.198154 * k, 0.000037),
        (239.56 + 25.513099 * k, 0.000035),
        (331.55 + 3.592518 * k, 0.000023),
    ];
    let additional: f64 = planetary
        .iter()
        .map(|&(arg, coef)| coef * arg.to_radians().sin())
        .sum();

    jde += periodic + additional;
    jde - delta_t(decimal_year(jde)) / SECONDS_PER_DAY
}
