//! Event favorability score.
//!
//! `total = clamp(natal + dynamic)`, where the natal part grades the birth chart
//! on its own (formation, sinsal, interactions among the four branches) and the
//! dynamic part weighs a target year's pillar against it. Every term is clamped
//! to its own range before being summed, and the sums are clamped again.

use super::*;
use crate::config::ScoringConfig;
use crate::formation::{DayStrength, FormationResult, Quality};
use crate::interactions::Interaction;
use crate::sinsal::Sinsal;
use crate::ten_gods::TenGodGroup;

// ---------------------------
// ## Intensity bands
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntensityLevel {
    High,
    Mid,
    Low,
    Warning,
    Critical,
}

impl IntensityLevel {
    /// Bands are closed below and open above; 100 falls in the top band.
    pub fn from_score(score: f64) -> IntensityLevel {
        if score >= 60.0 {
            IntensityLevel::High
        } else if score >= 20.0 {
            IntensityLevel::Mid
        } else if score >= -20.0 {
            IntensityLevel::Low
        } else if score >= -60.0 {
            IntensityLevel::Warning
        } else {
            IntensityLevel::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IntensityLevel::High => "Highly Favorable",
            IntensityLevel::Mid => "Favorable",
            IntensityLevel::Low => "Neutral",
            IntensityLevel::Warning => "Caution",
            IntensityLevel::Critical => "Challenging",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IntensityLevel::High => {
                "Very favorable energy detected. Good time for important decisions."
            }
            IntensityLevel::Mid => "Overall positive flow. Smooth progress expected.",
            IntensityLevel::Low => "Neutral period. Stability without major changes.",
            IntensityLevel::Warning => "Period requiring caution. Careful judgment needed.",
            IntensityLevel::Critical => {
                "Challenging period. Postpone major decisions and be defensive."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIntensity {
    pub level: IntensityLevel,
    pub label: String,
    pub description: String,
}

impl EventIntensity {
    pub fn from_score(score: f64) -> Self {
        let level = IntensityLevel::from_score(score);
        EventIntensity {
            level,
            label: level.label().to_string(),
            description: level.description().to_string(),
        }
    }
}

// ---------------------------
// ## Score
// ---------------------------

/// Each term after its own clamp.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub formation: f64,
    pub sinsal: f64,
    pub natal_interactions: f64,
    pub year_stem: f64,
    pub year_branch: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventScore {
    pub total: f64,
    pub natal_score: f64,
    pub dynamic_modifier: f64,
    pub components: ScoreComponents,
    pub intensity: EventIntensity,
    pub explanation: Vec<String>,
    pub target_year: Option<i32>,
    pub year_pillar: Option<GanZhi>,
}

pub fn formation_term(formation: &FormationResult, config: &ScoringConfig) -> f64 {
    let mut score = match formation.quality() {
        Quality::High => config.high_quality_points,
        Quality::Medium => config.medium_quality_points,
        Quality::Low => 0.0,
    };
    if formation.is_transparent() {
        score += config.transparency_points;
    }
    if *formation == FormationResult::Unclassified {
        score -= config.unclassified_penalty;
    }
    if formation.day_strength() == DayStrength::Balanced {
        score += config.balanced_points;
    }
    config.formation_range.clamp(score)
}

pub fn sinsal_term(sinsal: &[Sinsal], config: &ScoringConfig) -> f64 {
    let score: f64 = sinsal
        .iter()
        .map(|s| s.signed_weight() * config.sinsal_multiplier)
        .sum();
    config.sinsal_range.clamp(score)
}

pub fn natal_interaction_term(interactions: &[Interaction], config: &ScoringConfig) -> f64 {
    let points = &config.natal_interaction_points;
    let score: f64 = interactions
        .iter()
        .map(|interaction| interaction.weight * points.signed(interaction.kind))
        .sum();
    config.natal_interaction_range.clamp(score)
}

/// Groups that help and hurt the day master, most significant first.
fn favored_groups(day_strength: DayStrength) -> (&'static [TenGodGroup], &'static [TenGodGroup]) {
    use TenGodGroup::*;
    match day_strength {
        DayStrength::Strong => (&[Officer, Output, Wealth][..], &[Resource, Companion][..]),
        DayStrength::Weak => (&[Resource, Companion][..], &[Officer, Output, Wealth][..]),
        DayStrength::Balanced => (&[Output, Wealth][..], &[Officer][..]),
    }
}

/// Target-year stem against the day master, by Ten-God group and day strength.
pub fn year_stem_term(
    day_master: Stem,
    year_stem: Stem,
    day_strength: DayStrength,
    config: &ScoringConfig,
) -> f64 {
    let group = ten_gods::classify(day_master, year_stem).group();
    let (favorable, unfavorable) = favored_groups(day_strength);
    let magnitude = |rank: usize| {
        if rank == 0 {
            config.primary_group_points
        } else {
            config.secondary_group_points
        }
    };

    let score = if let Some(rank) = favorable.iter().position(|&g| g == group) {
        magnitude(rank)
    } else if let Some(rank) = unfavorable.iter().position(|&g| g == group) {
        -magnitude(rank)
    } else {
        0.0
    };
    config.year_stem_range.clamp(score)
}

/// Target-year branch against each natal branch; only the strongest relation
/// per natal branch counts.
pub fn year_branch_term(natal: &[Branch], year_branch: Branch, config: &ScoringConfig) -> f64 {
    let score: f64 = natal
        .iter()
        .filter_map(|&branch| interactions::strongest_relation(branch, year_branch))
        .map(|relation| config.year_interaction_points.signed(relation.kind))
        .sum();
    config.year_branch_range.clamp(score)
}

/// Scores a chart, optionally against the pillar of `target_year`.
pub fn score_event(
    chart: &Chart,
    formation: &FormationResult,
    sinsal: &[Sinsal],
    interactions: &[Interaction],
    target_year: Option<i32>,
    config: &ScoringConfig,
) -> EventScore {
    let mut explanation = Vec::new();
    let mut components = ScoreComponents {
        formation: formation_term(formation, config),
        sinsal: sinsal_term(sinsal, config),
        natal_interactions: natal_interaction_term(interactions, config),
        ..ScoreComponents::default()
    };

    let formation_name = match formation.formation() {
        Some(classified) => classified.kind.english_name(),
        None => "Unclassified",
    };
    explanation.push(format!(
        "Formation quality ({}, {}): {:+.1}",
        formation_name,
        formation.quality(),
        components.formation
    ));
    if sinsal.is_empty() {
        explanation.push(format!("Sinsal: {:+.1}", components.sinsal));
    } else {
        let lucky = sinsal.iter().filter(|s| s.lucky).count();
        explanation.push(format!(
            "Sinsal (Lucky:{}, Unlucky:{}): {:+.1}",
            lucky,
            sinsal.len() - lucky,
            components.sinsal
        ));
    }
    explanation.push(format!(
        "Natal interactions: {:+.1}",
        components.natal_interactions
    ));

    let natal_score = config
        .natal_range
        .clamp(components.formation + components.sinsal + components.natal_interactions);

    let mut dynamic_modifier = 0.0;
    let year_pillar = target_year.map(GanZhi::of_year);
    match year_pillar {
        Some(year) => {
            components.year_stem = year_stem_term(
                chart.day_master(),
                year.stem,
                formation.day_strength(),
                config,
            );
            explanation.push(format!(
                "Year stem {}({}): {:+.1}",
                year.stem,
                year.stem.element(),
                components.year_stem
            ));

            components.year_branch = year_branch_term(&chart.branches(), year.branch, config);
            explanation.push(format!(
                "Year branch {} interactions: {:+.1}",
                year.branch, components.year_branch
            ));

            dynamic_modifier = config
                .dynamic_range
                .clamp(components.year_stem + components.year_branch);
        }
        None => explanation.push("No year info (base score only)".to_string()),
    }

    let total = config.total_range.clamp(natal_score + dynamic_modifier);
    let intensity = EventIntensity::from_score(total);
    explanation.push(format!("--- Final: {:+.1} ({})", total, intensity.label));

    EventScore {
        total,
        natal_score,
        dynamic_modifier,
        components,
        intensity,
        explanation,
        target_year,
        year_pillar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormationPolicy;
    use crate::formation::{self, Formation, FormationKind};
    use crate::hidden_stems::HiddenStems;
    use crate::sinsal::SinsalKind;
    use crate::ten_gods::{aggregate_weighted, TenGod};
    use approx::assert_relative_eq;

    fn setup() -> (Chart, FormationResult, Vec<Sinsal>, Vec<Interaction>) {
        let chart = Chart::from_hanzi("庚午", "辛巳", "庚辰", "癸未").unwrap();
        let hidden = HiddenStems::of_chart(&chart);
        let counts = aggregate_weighted(&chart, &hidden);
        let formation = formation::classify(&chart, &hidden, &counts, &FormationPolicy::default());
        let sinsal = sinsal::detect(&chart);
        let interactions = interactions::analyze_chart(&chart);
        (chart, formation, sinsal, interactions)
    }

    fn classified(quality: Quality, day_strength: DayStrength, transparent: bool) -> FormationResult {
        FormationResult::Classified(Formation {
            kind: FormationKind::DirectOfficer,
            quality,
            day_strength,
            transparent,
            month_god: TenGod::DirectOfficer,
            description: String::new(),
        })
    }

    #[test]
    fn test_reference_chart_2026() {
        let (chart, formation, sinsal, interactions) = setup();
        let config = ScoringConfig::default();
        let score = score_event(&chart, &formation, &sinsal, &interactions, Some(2026), &config);

        assert_relative_eq!(score.components.formation, 15.0);
        assert_relative_eq!(score.components.sinsal, 20.0, epsilon = 1e-9);
        assert_relative_eq!(score.components.natal_interactions, 3.5, epsilon = 1e-9);
        assert_relative_eq!(score.natal_score, 38.5, epsilon = 1e-9);
        assert_relative_eq!(score.components.year_stem, -30.0);
        assert_relative_eq!(score.components.year_branch, 0.0);
        assert_relative_eq!(score.dynamic_modifier, -30.0);
        assert_relative_eq!(score.total, 8.5, epsilon = 1e-9);
        assert_eq!(score.intensity.level, IntensityLevel::Low);
        assert_eq!(score.year_pillar.map(|p| p.to_string()).as_deref(), Some("丙午"));

        assert_eq!(
            score.explanation,
            vec![
                "Formation quality (Seven Killings Frame, Medium): +15.0",
                "Sinsal (Lucky:6, Unlucky:1): +20.0",
                "Natal interactions: +3.5",
                "Year stem 丙(火): -30.0",
                "Year branch 午 interactions: +0.0",
                "--- Final: +8.5 (Neutral)",
            ]
        );
    }

    #[test]
    fn test_without_target_year() {
        let (chart, formation, sinsal, interactions) = setup();
        let score = score_event(
            &chart,
            &formation,
            &sinsal,
            &interactions,
            None,
            &ScoringConfig::default(),
        );
        assert_relative_eq!(score.dynamic_modifier, 0.0);
        assert_relative_eq!(score.total, score.natal_score);
        assert!(score.year_pillar.is_none());
        assert_eq!(score.explanation[3], "No year info (base score only)");
    }

    #[test]
    fn test_formation_term() {
        let config = ScoringConfig::default();
        let term = |f: &FormationResult| formation_term(f, &config);
        assert_relative_eq!(term(&classified(Quality::High, DayStrength::Balanced, true)), 30.0);
        assert_relative_eq!(term(&classified(Quality::High, DayStrength::Strong, true)), 30.0);
        assert_relative_eq!(term(&classified(Quality::Low, DayStrength::Weak, false)), 0.0);
        assert_relative_eq!(term(&classified(Quality::Medium, DayStrength::Weak, false)), 10.0);
        assert_relative_eq!(term(&FormationResult::Unclassified), -5.0);
    }

    #[test]
    fn test_sinsal_term_clamps() {
        let config = ScoringConfig::default();
        let many: Vec<_> = (0..12)
            .map(|_| Sinsal::new(SinsalKind::WhiteTiger, PillarPosition::Day))
            .collect();
        assert_relative_eq!(sinsal_term(&many, &config), -20.0);
        assert_relative_eq!(sinsal_term(&[], &config), 0.0);
        let one = [Sinsal::new(SinsalKind::HeavenlyNoble, PillarPosition::Hour)];
        assert_relative_eq!(sinsal_term(&one, &config), 4.5);
    }

    #[test]
    fn test_year_stem_by_day_strength() {
        let config = ScoringConfig::default();
        // Day master 庚: 丙 is Officer, 壬 Output, 甲 Wealth, 戊 Resource, 辛 Companion.
        let cases = [
            (DayStrength::Strong, Stem::Bing, 30.0),
            (DayStrength::Strong, Stem::Ren, 20.0),
            (DayStrength::Strong, Stem::Jia, 20.0),
            (DayStrength::Strong, Stem::Wu, -30.0),
            (DayStrength::Strong, Stem::Xin, -20.0),
            (DayStrength::Weak, Stem::Wu, 30.0),
            (DayStrength::Weak, Stem::Geng, 20.0),
            (DayStrength::Weak, Stem::Ding, -30.0),
            (DayStrength::Weak, Stem::Gui, -20.0),
            (DayStrength::Weak, Stem::Yi, -20.0),
            (DayStrength::Balanced, Stem::Gui, 30.0),
            (DayStrength::Balanced, Stem::Yi, 20.0),
            (DayStrength::Balanced, Stem::Ding, -30.0),
            (DayStrength::Balanced, Stem::Ji, 0.0),
            (DayStrength::Balanced, Stem::Xin, 0.0),
        ];
        for (strength, stem, expected) in cases {
            assert_relative_eq!(
                year_stem_term(Stem::Geng, stem, strength, &config),
                expected
            );
        }
    }

    #[test]
    fn test_year_branch_counts_strongest_relation_only() {
        let config = ScoringConfig::default();
        // 寅申 is both clash and punishment: only the clash counts.
        assert_relative_eq!(year_branch_term(&[Branch::Yin], Branch::Shen, &config), -15.0);
        // 巳申: combination wins over punishment and destruction.
        assert_relative_eq!(year_branch_term(&[Branch::Si], Branch::Shen, &config), 10.0);
        // Four clashing branches are clamped.
        let natal = [Branch::Zi; 4];
        assert_relative_eq!(year_branch_term(&natal, Branch::Wu, &config), -20.0);
    }

    #[test]
    fn test_intensity_bands() {
        assert_eq!(IntensityLevel::from_score(100.0), IntensityLevel::High);
        assert_eq!(IntensityLevel::from_score(60.0), IntensityLevel::High);
        assert_eq!(IntensityLevel::from_score(59.9), IntensityLevel::Mid);
        assert_eq!(IntensityLevel::from_score(20.0), IntensityLevel::Mid);
        assert_eq!(IntensityLevel::from_score(-20.0), IntensityLevel::Low);
        assert_eq!(IntensityLevel::from_score(-20.1), IntensityLevel::Warning);
        assert_eq!(IntensityLevel::from_score(-60.1), IntensityLevel::Critical);
        assert_eq!(IntensityLevel::from_score(-100.0), IntensityLevel::Critical);
        assert_eq!(IntensityLevel::Warning.label(), "Caution");
    }
}
