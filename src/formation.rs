use super::*;
use crate::config::FormationPolicy;
use crate::hidden_stems::HiddenStems;
use crate::ten_gods::{round2, TenGod, TenGodCounts, TenGodGroup};

// ---------------------------
// ## Enumerations
// ---------------------------

/// Chart archetype, named after the Ten God of the month branch's main qi.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    DirectOfficer,
    SevenKillings,
    DirectResource,
    IndirectResource,
    EatingGod,
    HurtingOfficer,
    DirectWealth,
    IndirectWealth,
    /// Companion month.
    Shoulder,
    RobWealth,
}

impl FormationKind {
    pub fn from_month_god(god: TenGod) -> FormationKind {
        match god {
            TenGod::Companion => FormationKind::Shoulder,
            TenGod::RobWealth => FormationKind::RobWealth,
            TenGod::EatingGod => FormationKind::EatingGod,
            TenGod::HurtingOfficer => FormationKind::HurtingOfficer,
            TenGod::IndirectWealth => FormationKind::IndirectWealth,
            TenGod::DirectWealth => FormationKind::DirectWealth,
            TenGod::SevenKillings => FormationKind::SevenKillings,
            TenGod::DirectOfficer => FormationKind::DirectOfficer,
            TenGod::IndirectResource => FormationKind::IndirectResource,
            TenGod::DirectResource => FormationKind::DirectResource,
        }
    }

    pub fn hanzi(self) -> &'static str {
        match self {
            FormationKind::DirectOfficer => "正官格",
            FormationKind::SevenKillings => "偏官格",
            FormationKind::DirectResource => "正印格",
            FormationKind::IndirectResource => "偏印格",
            FormationKind::EatingGod => "食神格",
            FormationKind::HurtingOfficer => "傷官格",
            FormationKind::DirectWealth => "正財格",
            FormationKind::IndirectWealth => "偏財格",
            FormationKind::Shoulder => "建祿格",
            FormationKind::RobWealth => "羊刃格",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            FormationKind::DirectOfficer => "Direct Officer Frame",
            FormationKind::SevenKillings => "Seven Killings Frame",
            FormationKind::DirectResource => "Direct Resource Frame",
            FormationKind::IndirectResource => "Indirect Resource Frame",
            FormationKind::EatingGod => "Eating God Frame",
            FormationKind::HurtingOfficer => "Hurting Officer Frame",
            FormationKind::DirectWealth => "Direct Wealth Frame",
            FormationKind::IndirectWealth => "Indirect Wealth Frame",
            FormationKind::Shoulder => "Shoulder Frame",
            FormationKind::RobWealth => "Rob Wealth Frame",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FormationKind::DirectOfficer => {
                "Disciplined and responsible; readily recognized within organizations"
            }
            FormationKind::SevenKillings => {
                "Charismatic and driven, though pressure and challenges follow"
            }
            FormationKind::DirectResource => {
                "Scholarly and patient; a wise advisor"
            }
            FormationKind::IndirectResource => {
                "Original thinking and artistic sense, with a tendency toward solitude"
            }
            FormationKind::EatingGod => {
                "Creative and expressive, enjoying steady fortune"
            }
            FormationKind::HurtingOfficer => {
                "Outstanding talent with a rebellious streak that can clash with authority"
            }
            FormationKind::DirectWealth => {
                "Diligent and sincere, skilled at managing wealth"
            }
            FormationKind::IndirectWealth => {
                "Business acumen; beware of speculative tendencies"
            }
            FormationKind::Shoulder => {
                "Self-reliant and independent; watch for conflict with siblings"
            }
            FormationKind::RobWealth => {
                "Strong will and decisiveness; beware of impulsiveness"
            }
        }
    }
}

impl fmt::Display for FormationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.english_name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Low => "Low",
            Quality::Medium => "Medium",
            Quality::High => "High",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStrength {
    Strong,
    Weak,
    Balanced,
}

impl fmt::Display for DayStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayStrength::Strong => "Strong",
            DayStrength::Weak => "Weak",
            DayStrength::Balanced => "Balanced",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Results
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub kind: FormationKind,
    pub quality: Quality,
    pub day_strength: DayStrength,
    /// The month's main qi also shows as a year, month or hour stem.
    pub transparent: bool,
    pub month_god: TenGod,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormationResult {
    Classified(Formation),
    /// No main qi could be read off the month branch.
    Unclassified,
}

impl FormationResult {
    pub fn quality(&self) -> Quality {
        match self {
            FormationResult::Classified(formation) => formation.quality,
            FormationResult::Unclassified => Quality::Low,
        }
    }

    pub fn day_strength(&self) -> DayStrength {
        match self {
            FormationResult::Classified(formation) => formation.day_strength,
            FormationResult::Unclassified => DayStrength::Balanced,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            FormationResult::Classified(formation) => formation.transparent,
            FormationResult::Unclassified => false,
        }
    }

    pub fn formation(&self) -> Option<&Formation> {
        match self {
            FormationResult::Classified(formation) => Some(formation),
            FormationResult::Unclassified => None,
        }
    }
}

impl fmt::Display for FormationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormationResult::Classified(formation) => write!(
                f,
                "{} ({} quality), day master {}{}",
                formation.kind,
                formation.quality,
                formation.day_strength,
                if formation.transparent { ", transparent" } else { "" }
            ),
            FormationResult::Unclassified => write!(f, "Unclassified"),
        }
    }
}

// ---------------------------
// ## Classification
// ---------------------------

/// Supporting (Resource + Companion) against draining (Wealth + Officer + Output) totals.
pub fn assess_day_strength(counts: &TenGodCounts, policy: &FormationPolicy) -> DayStrength {
    let supporting: f64 = TenGodGroup::ALL
        .into_iter()
        .filter(|group| group.supports_day_master())
        .map(|group| counts.group_total(group))
        .sum();
    let draining: f64 = TenGodGroup::ALL
        .into_iter()
        .filter(|group| !group.supports_day_master())
        .map(|group| counts.group_total(group))
        .sum();

    let difference = round2(supporting - draining);
    if difference > policy.strength_threshold {
        DayStrength::Strong
    } else if difference < -policy.strength_threshold {
        DayStrength::Weak
    } else {
        DayStrength::Balanced
    }
}

fn quality_score(
    kind: FormationKind,
    counts: &TenGodCounts,
    transparent: bool,
    day_strength: DayStrength,
    policy: &FormationPolicy,
) -> i32 {
    let present = |group: TenGodGroup| counts.group_total(group) >= policy.presence_threshold;
    let mut score = 0;

    if transparent {
        score += policy.transparency_points;
    }

    let supported = match day_strength {
        DayStrength::Strong => present(TenGodGroup::Wealth) || present(TenGodGroup::Officer),
        DayStrength::Weak => present(TenGodGroup::Resource) || present(TenGodGroup::Companion),
        DayStrength::Balanced => true,
    };
    if supported {
        score += policy.support_points;
    }

    // Hurting Officer meeting Direct Officer, Indirect Resource stealing the Eating God.
    let spoiler = match kind {
        FormationKind::HurtingOfficer => Some(TenGod::DirectOfficer),
        FormationKind::EatingGod => Some(TenGod::IndirectResource),
        _ => None,
    };
    if let Some(god) = spoiler {
        if counts.get(god) >= policy.presence_threshold {
            score -= policy.penalty_points;
        }
    }

    score
}

/// Classifies the chart by the Ten God of its month branch's main qi and grades it.
pub fn classify(
    chart: &Chart,
    hidden_stems: &HiddenStems,
    counts: &TenGodCounts,
    policy: &FormationPolicy,
) -> FormationResult {
    let main_qi = match hidden_stems.main_qi(PillarPosition::Month) {
        Some(stem) => stem,
        None => return FormationResult::Unclassified,
    };

    let month_god = ten_gods::classify(chart.day_master(), main_qi);
    let kind = FormationKind::from_month_god(month_god);
    let transparent = chart
        .outer_stems()
        .iter()
        .any(|&(_, stem)| stem == main_qi);
    let day_strength = assess_day_strength(counts, policy);

    let score = quality_score(kind, counts, transparent, day_strength, policy);
    let quality = if score >= policy.high_cutoff {
        Quality::High
    } else if score >= policy.medium_cutoff {
        Quality::Medium
    } else {
        Quality::Low
    };

    FormationResult::Classified(Formation {
        kind,
        quality,
        day_strength,
        transparent,
        month_god,
        description: kind.description().to_string(),
    })
}
