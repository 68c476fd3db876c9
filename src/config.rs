//! Engine policy loaded from TOML.
//!
//! Every threshold and point value used by the classifiers and the event
//! score lives here so it can be tuned and tested on its own. Missing keys
//! fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SajuError};
use crate::interactions::InteractionKind;

/// How to treat a timezone string that is not a recognized `GMT±N` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetPolicy {
    /// Log a warning and use `fallback_offset_hours`.
    Lenient,
    /// Reject with `SajuError::InvalidDate`.
    Strict,
}

/// Inclusive bounds a score term is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermRange {
    pub min: f64,
    pub max: f64,
}

impl TermRange {
    pub const fn new(min: f64, max: f64) -> Self {
        TermRange { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Unsigned magnitudes per interaction kind; combinations add, the rest subtract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindPoints {
    pub combination: f64,
    pub clash: f64,
    pub punishment: f64,
    pub harm: f64,
    pub destruction: f64,
}

impl KindPoints {
    pub fn signed(&self, kind: InteractionKind) -> f64 {
        match kind {
            InteractionKind::Combination => self.combination,
            InteractionKind::Clash => -self.clash,
            InteractionKind::Punishment => -self.punishment,
            InteractionKind::Harm => -self.harm,
            InteractionKind::Destruction => -self.destruction,
        }
    }
}

/// Formation grading constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationPolicy {
    /// Supporting minus draining totals beyond ± this is strong / weak.
    pub strength_threshold: f64,
    /// A category counts as present from this total upwards.
    pub presence_threshold: f64,
    pub transparency_points: i32,
    pub support_points: i32,
    pub penalty_points: i32,
    pub high_cutoff: i32,
    pub medium_cutoff: i32,
}

impl Default for FormationPolicy {
    fn default() -> Self {
        Self {
            strength_threshold: 1.5,
            presence_threshold: 1.0,
            transparency_points: 2,
            support_points: 1,
            penalty_points: 1,
            high_cutoff: 3,
            medium_cutoff: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub formation_range: TermRange,
    pub sinsal_range: TermRange,
    pub natal_interaction_range: TermRange,
    pub year_stem_range: TermRange,
    pub year_branch_range: TermRange,
    pub natal_range: TermRange,
    pub dynamic_range: TermRange,
    pub total_range: TermRange,

    pub high_quality_points: f64,
    pub medium_quality_points: f64,
    pub transparency_points: f64,
    pub unclassified_penalty: f64,
    pub balanced_points: f64,

    /// Each sinsal contributes ± weight × this.
    pub sinsal_multiplier: f64,
    /// Natal pairs contribute weight × these.
    pub natal_interaction_points: KindPoints,
    /// Year-branch hits score these flat, one per natal branch.
    pub year_interaction_points: KindPoints,

    /// First favorable (or unfavorable) group for the day strength.
    pub primary_group_points: f64,
    /// Remaining favorable (or unfavorable) groups.
    pub secondary_group_points: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            formation_range: TermRange::new(-20.0, 30.0),
            sinsal_range: TermRange::new(-20.0, 20.0),
            natal_interaction_range: TermRange::new(-20.0, 20.0),
            year_stem_range: TermRange::new(-30.0, 30.0),
            year_branch_range: TermRange::new(-20.0, 20.0),
            natal_range: TermRange::new(-60.0, 70.0),
            dynamic_range: TermRange::new(-50.0, 50.0),
            total_range: TermRange::new(-100.0, 100.0),

            high_quality_points: 20.0,
            medium_quality_points: 10.0,
            transparency_points: 10.0,
            unclassified_penalty: 10.0,
            balanced_points: 5.0,

            sinsal_multiplier: 5.0,
            natal_interaction_points: KindPoints {
                combination: 5.0,
                clash: 6.0,
                punishment: 7.5,
                harm: 4.0,
                destruction: 2.5,
            },
            year_interaction_points: KindPoints {
                combination: 10.0,
                clash: 15.0,
                punishment: 10.0,
                harm: 5.0,
                destruction: 3.0,
            },

            primary_group_points: 30.0,
            secondary_group_points: 20.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("formation_range", self.formation_range),
            ("sinsal_range", self.sinsal_range),
            ("natal_interaction_range", self.natal_interaction_range),
            ("year_stem_range", self.year_stem_range),
            ("year_branch_range", self.year_branch_range),
            ("natal_range", self.natal_range),
            ("dynamic_range", self.dynamic_range),
            ("total_range", self.total_range),
        ];
        for (name, range) in ranges {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(SajuError::Config(format!(
                    "{} must satisfy min <= max, got [{}, {}]",
                    name, range.min, range.max
                )));
            }
        }
        if self.total_range.min < -100.0 || self.total_range.max > 100.0 {
            return Err(SajuError::Config(
                "total_range must lie within [-100, 100]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Upper bound on `luck_cycle_count`: one full sixty-pair cycle of periods.
pub const MAX_LUCK_CYCLE_COUNT: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_year: i32,
    pub max_year: i32,
    pub offset_policy: OffsetPolicy,
    pub fallback_offset_hours: i32,
    pub luck_cycle_count: usize,
    pub formation: FormationPolicy,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_year: 1900,
            max_year: 2100,
            offset_policy: OffsetPolicy::Lenient,
            fallback_offset_hours: 9,
            luck_cycle_count: 10,
            formation: FormationPolicy::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_year > self.max_year {
            return Err(SajuError::Config(format!(
                "min_year {} is after max_year {}",
                self.min_year, self.max_year
            )));
        }
        if self.fallback_offset_hours.abs() > 14 {
            return Err(SajuError::Config(format!(
                "fallback_offset_hours {} is not a real UTC offset",
                self.fallback_offset_hours
            )));
        }
        if self.luck_cycle_count > MAX_LUCK_CYCLE_COUNT {
            return Err(SajuError::Config(format!(
                "luck_cycle_count {} exceeds {}",
                self.luck_cycle_count, MAX_LUCK_CYCLE_COUNT
            )));
        }
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_offset_hours, 9);
        assert_eq!(config.scoring.total_range, TermRange::new(-100.0, 100.0));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            offset_policy = "strict"
            luck_cycle_count = 8

            [formation]
            strength_threshold = 2.0

            [scoring.natal_interaction_points]
            combination = 4.0
            clash = 6.0
            punishment = 7.5
            harm = 4.0
            destruction = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.offset_policy, OffsetPolicy::Strict);
        assert_eq!(config.luck_cycle_count, 8);
        assert_eq!(config.formation.strength_threshold, 2.0);
        assert_eq!(config.formation.high_cutoff, 3);
        assert_eq!(config.scoring.natal_interaction_points.combination, 4.0);
        assert_eq!(config.scoring.sinsal_multiplier, 5.0);
        assert_eq!(config.min_year, 1900);
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        let inverted = EngineConfig::from_toml_str(
            r#"
            [scoring.sinsal_range]
            min = 10.0
            max = -10.0
            "#,
        );
        assert!(matches!(inverted, Err(SajuError::Config(_))));

        let too_wide = EngineConfig::from_toml_str(
            r#"
            [scoring.total_range]
            min = -150.0
            max = 100.0
            "#,
        );
        assert!(matches!(too_wide, Err(SajuError::Config(_))));

        assert!(matches!(
            EngineConfig::from_toml_str("min_year = 2200"),
            Err(SajuError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("luck_cycle_count = \"ten\""),
            Err(SajuError::Toml(_))
        ));
    }

    #[test]
    fn test_luck_cycle_count_is_bounded() {
        let config = EngineConfig::from_toml_str("luck_cycle_count = 60").unwrap();
        assert_eq!(config.luck_cycle_count, MAX_LUCK_CYCLE_COUNT);
        assert!(matches!(
            EngineConfig::from_toml_str("luck_cycle_count = 61"),
            Err(SajuError::Config(_))
        ));

        let huge = EngineConfig {
            luck_cycle_count: usize::MAX,
            ..EngineConfig::default()
        };
        assert!(matches!(huge.validate(), Err(SajuError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_year = 2050").unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_year, 2050);

        let missing = EngineConfig::from_path("/nonexistent/saju.toml");
        assert!(matches!(missing, Err(SajuError::Io(_))));
    }

    #[test]
    fn test_kind_points_sign() {
        let points = ScoringConfig::default().year_interaction_points;
        assert_eq!(points.signed(InteractionKind::Combination), 10.0);
        assert_eq!(points.signed(InteractionKind::Clash), -15.0);
        assert_eq!(points.signed(InteractionKind::Destruction), -3.0);
    }

    #[test]
    fn test_term_range_clamp() {
        let range = TermRange::new(-20.0, 30.0);
        assert_eq!(range.clamp(45.0), 30.0);
        assert_eq!(range.clamp(-45.0), -20.0);
        assert_eq!(range.clamp(3.5), 3.5);
    }
}
