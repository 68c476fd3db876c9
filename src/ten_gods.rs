use lazy_static::lazy_static;
use std::collections::BTreeMap;

use super::*;
use crate::hidden_stems::HiddenStems;

// ---------------------------
// ## Categories
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenGod {
    Companion,
    RobWealth,
    EatingGod,
    HurtingOfficer,
    IndirectWealth,
    DirectWealth,
    SevenKillings,
    DirectOfficer,
    IndirectResource,
    DirectResource,
}

impl TenGod {
    pub const ALL: [TenGod; 10] = [
        TenGod::Companion,
        TenGod::RobWealth,
        TenGod::EatingGod,
        TenGod::HurtingOfficer,
        TenGod::IndirectWealth,
        TenGod::DirectWealth,
        TenGod::SevenKillings,
        TenGod::DirectOfficer,
        TenGod::IndirectResource,
        TenGod::DirectResource,
    ];

    pub fn group(self) -> TenGodGroup {
        TenGodGroup::ALL[self as usize / 2]
    }

    pub fn hanzi(self) -> &'static str {
        match self {
            TenGod::Companion => "比肩",
            TenGod::RobWealth => "劫財",
            TenGod::EatingGod => "食神",
            TenGod::HurtingOfficer => "傷官",
            TenGod::IndirectWealth => "偏財",
            TenGod::DirectWealth => "正財",
            TenGod::SevenKillings => "偏官",
            TenGod::DirectOfficer => "正官",
            TenGod::IndirectResource => "偏印",
            TenGod::DirectResource => "正印",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            TenGod::Companion => "Companion",
            TenGod::RobWealth => "Rob Wealth",
            TenGod::EatingGod => "Eating God",
            TenGod::HurtingOfficer => "Hurting Officer",
            TenGod::IndirectWealth => "Indirect Wealth",
            TenGod::DirectWealth => "Direct Wealth",
            TenGod::SevenKillings => "Seven Killings",
            TenGod::DirectOfficer => "Direct Officer",
            TenGod::IndirectResource => "Indirect Resource",
            TenGod::DirectResource => "Direct Resource",
        }
    }
}

impl fmt::Display for TenGod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.english_name())
    }
}

/// The five pairs the ten categories fall into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenGodGroup {
    Companion,
    Output,
    Wealth,
    Officer,
    Resource,
}

impl TenGodGroup {
    pub const ALL: [TenGodGroup; 5] = [
        TenGodGroup::Companion,
        TenGodGroup::Output,
        TenGodGroup::Wealth,
        TenGodGroup::Officer,
        TenGodGroup::Resource,
    ];

    /// Same-polarity member first.
    pub fn members(self) -> [TenGod; 2] {
        let first = self as usize * 2;
        [TenGod::ALL[first], TenGod::ALL[first + 1]]
    }

    /// Companion and Resource support the day master; the rest drain it.
    pub fn supports_day_master(self) -> bool {
        matches!(self, TenGodGroup::Companion | TenGodGroup::Resource)
    }

    pub fn hanzi(self) -> &'static str {
        match self {
            TenGodGroup::Companion => "比劫",
            TenGodGroup::Output => "食傷",
            TenGodGroup::Wealth => "財星",
            TenGodGroup::Officer => "官星",
            TenGodGroup::Resource => "印星",
        }
    }
}

impl fmt::Display for TenGodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TenGodGroup::Companion => "Companion",
            TenGodGroup::Output => "Output",
            TenGodGroup::Wealth => "Wealth",
            TenGodGroup::Officer => "Officer",
            TenGodGroup::Resource => "Resource",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Classification
// ---------------------------

/// How the target's element stands to the reference element.
fn relation_group(reference: Element, target: Element) -> TenGodGroup {
    if reference == target {
        TenGodGroup::Companion
    } else if reference.generates() == target {
        TenGodGroup::Output
    } else if reference.overcomes() == target {
        TenGodGroup::Wealth
    } else if target.overcomes() == reference {
        TenGodGroup::Officer
    } else {
        debug_assert_eq!(
            target.generates(),
            reference,
            "{} and {} share no cycle relation",
            reference,
            target
        );
        TenGodGroup::Resource
    }
}

fn classify_by_rules(reference: Stem, target: Stem) -> TenGod {
    let [same_polarity, different_polarity] =
        relation_group(reference.element(), target.element()).members();
    if reference.polarity() == target.polarity() {
        same_polarity
    } else {
        different_polarity
    }
}

lazy_static! {
    static ref TEN_GOD_TABLE: [[TenGod; 10]; 10] = {
        let mut table = [[TenGod::Companion; 10]; 10];
        for reference in Stem::ALL {
            for target in Stem::ALL {
                table[reference.index()][target.index()] = classify_by_rules(reference, target);
            }
        }
        table
    };
}

/// Ten-God category of `target` seen from `reference` (normally the day master).
pub fn classify(reference: Stem, target: Stem) -> TenGod {
    TEN_GOD_TABLE[reference.index()][target.index()]
}

/// Category of a branch, read through its main hidden stem.
pub fn classify_branch(reference: Stem, branch: Branch) -> TenGod {
    classify(reference, hidden_stems::main_qi(branch))
}

// ---------------------------
// ## Weighted counts
// ---------------------------

/// Accumulated weight per category, every category present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenGodCounts(BTreeMap<TenGod, f64>);

impl Default for TenGodCounts {
    fn default() -> Self {
        TenGodCounts(TenGod::ALL.into_iter().map(|god| (god, 0.0)).collect())
    }
}

impl TenGodCounts {
    pub fn add(&mut self, god: TenGod, weight: f64) {
        *self.0.entry(god).or_insert(0.0) += weight;
    }

    pub fn get(&self, god: TenGod) -> f64 {
        self.0.get(&god).copied().unwrap_or(0.0)
    }

    /// Sum of a group's two categories, rounded to two decimals.
    pub fn group_total(&self, group: TenGodGroup) -> f64 {
        let [a, b] = group.members();
        round2(self.get(a) + self.get(b))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Heaviest category; ties go to the earlier category.
    pub fn dominant(&self) -> TenGod {
        TenGod::ALL
            .into_iter()
            .fold(TenGod::Companion, |best, god| {
                if self.get(god) > self.get(best) {
                    god
                } else {
                    best
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (TenGod, f64)> + '_ {
        self.0.iter().map(|(&god, &weight)| (god, weight))
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted counts relative to the day master.
///
/// Visible stems of the year, month and hour pillars count 1.0. Hidden stems of all
/// four branches count 1.0 for the main qi and 0.3 for the rest.
pub fn aggregate_weighted(chart: &Chart, hidden_stems: &HiddenStems) -> TenGodCounts {
    let day_master = chart.day_master();
    let mut counts = TenGodCounts::default();

    for (_, stem) in chart.outer_stems() {
        counts.add(classify(day_master, stem), 1.0);
    }
    for (_, stems) in hidden_stems.iter() {
        for hidden in stems {
            counts.add(classify(day_master, hidden.stem), hidden.weight);
        }
    }
    counts
}

/// Categories weighing at least 0.5, heaviest first: `"Direct Officer: 1.3, ..."`.
pub fn format_counts(counts: &TenGodCounts) -> String {
    let mut significant: Vec<(TenGod, f64)> =
        counts.iter().filter(|&(_, weight)| weight >= 0.5).collect();
    if significant.is_empty() {
        return "no notable distribution".to_string();
    }
    // stable sort keeps category order among equal weights
    significant.sort_by(|a, b| b.1.total_cmp(&a.1));
    significant
        .iter()
        .map(|(god, weight)| format!("{}: {:.1}", god, weight))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenGodSummary {
    pub counts: TenGodCounts,
    pub group_totals: BTreeMap<TenGodGroup, f64>,
    pub dominant: TenGod,
    pub summary: String,
}

impl TenGodSummary {
    pub fn from_chart(chart: &Chart, hidden_stems: &HiddenStems) -> Self {
        Self::from_counts(aggregate_weighted(chart, hidden_stems))
    }

    pub fn from_counts(counts: TenGodCounts) -> Self {
        let group_totals = TenGodGroup::ALL
            .into_iter()
            .map(|group| (group, counts.group_total(group)))
            .collect();
        TenGodSummary {
            dominant: counts.dominant(),
            summary: format_counts(&counts),
            group_totals,
            counts,
        }
    }
}
