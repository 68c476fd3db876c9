use chrono::Datelike;
use tracing::debug;

use super::*;
use crate::ten_gods::{round2, TenGod};

pub const MIN_START_AGE: u32 = 1;
pub const MAX_START_AGE: u32 = 10;
const DAYS_PER_YEAR_OF_LUCK: f64 = 3.0;
const PERIOD_YEARS: u32 = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuckDirection {
    Forward,
    Backward,
}

impl LuckDirection {
    pub fn step(self) -> i64 {
        match self {
            LuckDirection::Forward => 1,
            LuckDirection::Backward => -1,
        }
    }
}

/// Forward for a yang year and a male, or a yin year and a female; backward otherwise.
pub fn direction(gender: Gender, year_stem: Stem) -> LuckDirection {
    match (gender, year_stem.polarity()) {
        (Gender::Male, Polarity::Yang) | (Gender::Female, Polarity::Yin) => LuckDirection::Forward,
        _ => LuckDirection::Backward,
    }
}

/// Three days to the governing solar term count as one year, clamped to `1..=10`.
pub fn start_age(days_to_term: f64) -> u32 {
    let age = (days_to_term.abs() / DAYS_PER_YEAR_OF_LUCK).round();
    if age.is_nan() {
        return MIN_START_AGE;
    }
    (age as u32).clamp(MIN_START_AGE, MAX_START_AGE)
}

/// One ten-year period.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuckCycleEntry {
    pub index: usize,
    pub start_age: u32,
    pub end_age: u32,
    pub stem: Stem,
    pub branch: Branch,
    pub start_year: i32,
    pub stem_ten_god: TenGod,
    /// Classified through the branch's main qi.
    pub branch_ten_god: TenGod,
}

impl LuckCycleEntry {
    pub fn ganzhi(&self) -> GanZhi {
        GanZhi::new(self.stem, self.branch)
    }
}

impl fmt::Display for LuckCycleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} ages {}-{} from {}",
            self.stem, self.branch, self.start_age, self.end_age, self.start_year
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckCycle {
    pub direction: LuckDirection,
    pub start_age: u32,
    /// Distance to the governing sectional term, in days.
    pub days_to_term: f64,
    pub birth_year: i32,
    /// Month pillar the periods step away from.
    pub month: GanZhi,
    pub day_master: Stem,
    pub entries: Vec<LuckCycleEntry>,
}

impl LuckCycle {
    pub fn generate(
        month: GanZhi,
        day_master: Stem,
        direction: LuckDirection,
        days_to_term: f64,
        birth_year: i32,
        count: usize,
    ) -> Self {
        let mut cycle = LuckCycle {
            direction,
            start_age: start_age(days_to_term),
            days_to_term: round2(days_to_term.abs()),
            birth_year,
            month,
            day_master,
            entries: Vec::with_capacity(count),
        };
        cycle.entries = (0..count).map(|index| cycle.period(index)).collect();
        cycle
    }

    /// Period `index` (0-based), whether or not it is among `entries`. Ages and
    /// years saturate for indices far beyond a lifetime.
    pub fn period(&self, index: usize) -> LuckCycleEntry {
        // the pair repeats every sixty periods
        let steps = self.direction.step() * ((index % 60) as i64 + 1);
        let stem = self.month.stem.offset(steps);
        let branch = self.month.branch.offset(steps);
        let offset = u32::try_from(index)
            .unwrap_or(u32::MAX)
            .saturating_mul(PERIOD_YEARS);
        let start_age = self.start_age.saturating_add(offset);
        let start_year = self
            .birth_year
            .saturating_add(i32::try_from(start_age).unwrap_or(i32::MAX))
            .saturating_sub(1);
        LuckCycleEntry {
            index,
            start_age,
            end_age: start_age.saturating_add(PERIOD_YEARS - 1),
            stem,
            branch,
            start_year,
            stem_ten_god: ten_gods::classify(self.day_master, stem),
            branch_ten_god: ten_gods::classify_branch(self.day_master, branch),
        }
    }

    /// Period covering `age`, counted with birth as age 1; `None` before the first period.
    pub fn active_at_age(&self, age: u32) -> Option<LuckCycleEntry> {
        if age < self.start_age {
            return None;
        }
        Some(self.period(((age - self.start_age) / PERIOD_YEARS) as usize))
    }

    pub fn active_in_year(&self, year: i32) -> Option<LuckCycleEntry> {
        let age = i64::from(year) - i64::from(self.birth_year) + 1;
        u32::try_from(age).ok().and_then(|age| self.active_at_age(age))
    }
}

impl<C: CalendarService> SajuEngine<C> {
    /// Luck cycle from the distance between birth and the next (forward) or
    /// previous (backward) sectional term.
    pub fn calculate_luck_cycle(
        &self,
        chart: &Chart,
        instant: &SolarInstant,
        gender: Gender,
    ) -> Result<LuckCycle> {
        let calendar = self.calendar();
        let direction = direction(gender, chart.year.stem);

        let term = match direction {
            LuckDirection::Forward => calendar.next_solar_term(instant)?,
            LuckDirection::Backward => calendar.prev_solar_term(instant)?,
        };
        let days = calendar.continuous_day_count(&term)
            - calendar.continuous_day_count(&instant.utc());

        let cycle = LuckCycle::generate(
            chart.month.ganzhi(),
            chart.day_master(),
            direction,
            days,
            instant.local().year(),
            self.config().luck_cycle_count,
        );
        debug!(
            direction = ?cycle.direction,
            days_to_term = cycle.days_to_term,
            start_age = cycle.start_age,
            "luck cycle start"
        );
        Ok(cycle)
    }
}
