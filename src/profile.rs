use super::*;
use crate::hidden_stems::HiddenStems;
use crate::ten_gods::TenGod;

pub const BASE_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 10;
pub const MAX_SCORE: i32 = 90;

const HIDDEN_MAIN_QI_WEIGHT: f64 = 0.5;

type Modifiers = &'static [(TenGod, i32)];

use TenGod::*;

const WORK: [(&str, Modifiers); 5] = [
    ("planning", &[(DirectResource, 10), (IndirectResource, 8), (DirectOfficer, 6), (EatingGod, 4), (Companion, -2), (RobWealth, -4)]),
    ("drive", &[(Companion, 10), (RobWealth, 8), (SevenKillings, 6), (HurtingOfficer, 4), (IndirectResource, -3), (DirectResource, -2)]),
    ("execution", &[(IndirectWealth, 10), (DirectWealth, 8), (EatingGod, 6), (HurtingOfficer, 5), (DirectResource, -3), (IndirectResource, -4)]),
    ("completion", &[(DirectOfficer, 10), (DirectWealth, 8), (EatingGod, 6), (IndirectWealth, 4), (HurtingOfficer, -3), (RobWealth, -4)]),
    ("management", &[(DirectOfficer, 10), (SevenKillings, 8), (DirectResource, 6), (DirectWealth, 4), (RobWealth, -4), (HurtingOfficer, -5)]),
];

const LOVE: [(&str, Modifiers); 10] = [
    ("consideration", &[(DirectResource, 10), (DirectWealth, 8), (EatingGod, 6), (DirectOfficer, 4), (RobWealth, -5), (HurtingOfficer, -3)]),
    ("humor", &[(EatingGod, 10), (HurtingOfficer, 8), (IndirectWealth, 6), (RobWealth, 4), (DirectOfficer, -3), (SevenKillings, -4)]),
    ("sincerity", &[(DirectOfficer, 10), (DirectWealth, 8), (DirectResource, 6), (Companion, 4), (HurtingOfficer, -4), (IndirectWealth, -3)]),
    ("emotion", &[(HurtingOfficer, 10), (EatingGod, 8), (IndirectResource, 5), (DirectWealth, 3), (SevenKillings, -3), (DirectOfficer, -2)]),
    ("adventure", &[(IndirectWealth, 10), (HurtingOfficer, 8), (RobWealth, 6), (SevenKillings, 5), (DirectResource, -4), (DirectOfficer, -3)]),
    ("sociability", &[(IndirectWealth, 10), (EatingGod, 8), (HurtingOfficer, 6), (RobWealth, 4), (IndirectResource, -4), (DirectResource, -2)]),
    ("finance", &[(DirectWealth, 10), (IndirectWealth, 8), (EatingGod, 5), (DirectOfficer, 4), (RobWealth, -5), (Companion, -3)]),
    ("trustworthiness", &[(DirectOfficer, 10), (DirectWealth, 8), (DirectResource, 6), (Companion, 3), (HurtingOfficer, -5), (RobWealth, -3)]),
    ("expressiveness", &[(HurtingOfficer, 10), (EatingGod, 8), (IndirectWealth, 5), (RobWealth, 3), (DirectOfficer, -3), (SevenKillings, -2)]),
    ("self_esteem", &[(Companion, 8), (RobWealth, 6), (SevenKillings, 5), (HurtingOfficer, 4), (DirectResource, -2), (EatingGod, -1)]),
];

const APTITUDE: [(&str, Modifiers); 2] = [
    ("artistry", &[(HurtingOfficer, 11), (EatingGod, 9), (IndirectResource, 7), (IndirectWealth, 4), (DirectOfficer, -3), (SevenKillings, -4)]),
    ("business", &[(IndirectWealth, 11), (DirectWealth, 8), (EatingGod, 6), (SevenKillings, 4), (DirectResource, -3), (IndirectResource, -2)]),
];

const WEALTH: [(&str, Modifiers); 2] = [
    ("stability", &[(DirectWealth, 11), (DirectOfficer, 8), (DirectResource, 6), (Companion, 3), (RobWealth, -5), (IndirectWealth, -2)]),
    ("growth", &[(IndirectWealth, 11), (EatingGod, 8), (HurtingOfficer, 6), (SevenKillings, 4), (DirectResource, -3), (Companion, -2)]),
];

/// Whole-number occurrences of each Ten God, used by the trait scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraitCounts([i32; 10]);

impl TraitCounts {
    /// Visible year, month and hour stems count 1, each branch counts 1 for its
    /// main qi, and each pillar's main hidden stem adds 0.5. Totals are rounded
    /// half to even.
    pub fn from_chart(chart: &Chart, hidden_stems: &HiddenStems) -> Self {
        let day_master = chart.day_master();
        let mut raw = [0.0_f64; 10];

        for (_, stem) in chart.outer_stems() {
            raw[ten_gods::classify(day_master, stem) as usize] += 1.0;
        }
        for (position, pillar) in chart.pillars() {
            raw[ten_gods::classify_branch(day_master, pillar.branch) as usize] += 1.0;
            if let Some(main_qi) = hidden_stems.main_qi(position) {
                raw[ten_gods::classify(day_master, main_qi) as usize] += HIDDEN_MAIN_QI_WEIGHT;
            }
        }

        TraitCounts(raw.map(|count| count.round_ties_even() as i32))
    }

    pub fn get(&self, god: TenGod) -> i32 {
        self.0[god as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitScore {
    pub name: String,
    pub score: i32,
}

/// Per-area trait scores in the 10..=90 band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitProfile {
    pub work: Vec<TraitScore>,
    pub love: Vec<TraitScore>,
    pub aptitude: Vec<TraitScore>,
    pub wealth: Vec<TraitScore>,
}

fn area_scores(counts: &TraitCounts, table: &[(&str, Modifiers)]) -> Vec<TraitScore> {
    table
        .iter()
        .map(|&(name, modifiers)| {
            let score = BASE_SCORE
                + modifiers
                    .iter()
                    .map(|&(god, modifier)| modifier * counts.get(god))
                    .sum::<i32>();
            TraitScore {
                name: name.to_string(),
                score: score.clamp(MIN_SCORE, MAX_SCORE),
            }
        })
        .collect()
}

impl TraitProfile {
    pub fn calculate(chart: &Chart, hidden_stems: &HiddenStems) -> Self {
        Self::from_counts(&TraitCounts::from_chart(chart, hidden_stems))
    }

    pub fn from_counts(counts: &TraitCounts) -> Self {
        TraitProfile {
            work: area_scores(counts, &WORK),
            love: area_scores(counts, &LOVE),
            aptitude: area_scores(counts, &APTITUDE),
            wealth: area_scores(counts, &WEALTH),
        }
    }

    /// Looks a trait up by name across all areas.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.work
            .iter()
            .chain(&self.love)
            .chain(&self.aptitude)
            .chain(&self.wealth)
            .find(|trait_score| trait_score.name == name)
            .map(|trait_score| trait_score.score)
    }
}
