use super::*;

pub const DOMINANT_WEIGHT: f64 = 1.0;
pub const MINOR_WEIGHT: f64 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenRole {
    /// Residual qi carried over from the previous season.
    Minor,
    Middle,
    /// Main qi, always listed last.
    Dominant,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenStem {
    pub stem: Stem,
    pub role: HiddenRole,
    pub weight: f64,
}

use Stem::*;

// Main qi last.
const HIDDEN_STEM_TABLE: [&[Stem]; 12] = [
    &[Gui],            // 子
    &[Gui, Xin, Ji],   // 丑
    &[Wu, Bing, Jia],  // 寅
    &[Yi],             // 卯
    &[Yi, Gui, Wu],    // 辰
    &[Wu, Geng, Bing], // 巳
    &[Ji, Ding],       // 午
    &[Ding, Yi, Ji],   // 未
    &[Ji, Ren, Geng],  // 申
    &[Xin],            // 酉
    &[Xin, Ding, Wu],  // 戌
    &[Wu, Jia, Ren],   // 亥
];

/// Hidden stems of `branch` in table order.
pub fn table_entry(branch: Branch) -> &'static [Stem] {
    HIDDEN_STEM_TABLE[branch.index()]
}

/// The dominant hidden stem of `branch`.
pub fn main_qi(branch: Branch) -> Stem {
    let stems = table_entry(branch);
    stems[stems.len() - 1]
}

pub fn hidden_stems(branch: Branch) -> Vec<HiddenStem> {
    let stems = table_entry(branch);
    let last = stems.len() - 1;
    stems
        .iter()
        .enumerate()
        .map(|(i, &stem)| {
            let role = if i == last {
                HiddenRole::Dominant
            } else if i == 0 {
                HiddenRole::Minor
            } else {
                HiddenRole::Middle
            };
            let weight = if role == HiddenRole::Dominant {
                DOMINANT_WEIGHT
            } else {
                MINOR_WEIGHT
            };
            HiddenStem { stem, role, weight }
        })
        .collect()
}

/// Hidden stems of each pillar's branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenStems {
    pub year: Vec<HiddenStem>,
    pub month: Vec<HiddenStem>,
    pub day: Vec<HiddenStem>,
    pub hour: Vec<HiddenStem>,
}

impl HiddenStems {
    pub fn of_chart(chart: &Chart) -> Self {
        HiddenStems {
            year: hidden_stems(chart.year.branch),
            month: hidden_stems(chart.month.branch),
            day: hidden_stems(chart.day.branch),
            hour: hidden_stems(chart.hour.branch),
        }
    }

    pub fn at(&self, position: PillarPosition) -> &[HiddenStem] {
        match position {
            PillarPosition::Year => &self.year,
            PillarPosition::Month => &self.month,
            PillarPosition::Day => &self.day,
            PillarPosition::Hour => &self.hour,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PillarPosition, &[HiddenStem])> {
        PillarPosition::ALL
            .into_iter()
            .map(move |position| (position, self.at(position)))
    }

    /// Dominant entry at `position`; `None` only for hand-built, empty sets.
    pub fn main_qi(&self, position: PillarPosition) -> Option<Stem> {
        self.at(position).last().map(|hidden| hidden.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_every_branch_has_entries() {
        for branch in Branch::ALL {
            let stems = hidden_stems(branch);
            assert!((1..=3).contains(&stems.len()), "{}", branch);
            let (last, rest) = stems.split_last().unwrap();
            assert_eq!(last.role, HiddenRole::Dominant);
            assert_relative_eq!(last.weight, 1.0);
            assert!(rest.iter().all(|h| h.weight == MINOR_WEIGHT));
            assert_eq!(main_qi(branch), last.stem);
        }
    }

    #[test]
    fn test_known_entries() {
        assert_eq!(table_entry(Branch::Zi), &[Gui]);
        assert_eq!(table_entry(Branch::Chou), &[Gui, Xin, Ji]);
        assert_eq!(table_entry(Branch::Wu), &[Ji, Ding]);
        assert_eq!(table_entry(Branch::Si), &[Wu, Geng, Bing]);
        assert_eq!(table_entry(Branch::Wei), &[Ding, Yi, Ji]);

        let roles: Vec<_> = hidden_stems(Branch::Si).iter().map(|h| h.role).collect();
        assert_eq!(
            roles,
            vec![HiddenRole::Minor, HiddenRole::Middle, HiddenRole::Dominant]
        );
        let roles: Vec<_> = hidden_stems(Branch::Wu).iter().map(|h| h.role).collect();
        assert_eq!(roles, vec![HiddenRole::Minor, HiddenRole::Dominant]);
    }

    #[test]
    fn test_full_table() {
        let expected: [(Branch, &[Stem]); 12] = [
            (Branch::Zi, &[Gui]),
            (Branch::Chou, &[Gui, Xin, Ji]),
            (Branch::Yin, &[Wu, Bing, Jia]),
            (Branch::Mao, &[Yi]),
            (Branch::Chen, &[Yi, Gui, Wu]),
            (Branch::Si, &[Wu, Geng, Bing]),
            (Branch::Wu, &[Ji, Ding]),
            (Branch::Wei, &[Ding, Yi, Ji]),
            (Branch::Shen, &[Ji, Ren, Geng]),
            (Branch::You, &[Xin]),
            (Branch::Xu, &[Xin, Ding, Wu]),
            (Branch::Hai, &[Wu, Jia, Ren]),
        ];
        for (branch, stems) in expected {
            assert_eq!(table_entry(branch), stems, "{}", branch);
        }
    }

    #[test]
    fn test_single_stem_branches() {
        let single: Vec<_> = Branch::ALL
            .into_iter()
            .filter(|&b| table_entry(b).len() == 1)
            .collect();
        assert_eq!(single, vec![Branch::Zi, Branch::Mao, Branch::You]);
    }

    #[test]
    fn test_main_qi_shares_branch_element() {
        for branch in Branch::ALL {
            assert_eq!(main_qi(branch).element(), branch.element(), "{}", branch);
        }
    }

    #[test]
    fn test_chart_lookup() {
        let chart = Chart::from_hanzi("庚午", "辛巳", "庚辰", "癸未").unwrap();
        let hidden = HiddenStems::of_chart(&chart);
        assert_eq!(hidden.main_qi(PillarPosition::Month), Some(Bing));
        assert_eq!(hidden.at(PillarPosition::Day).len(), 3);
        let total: usize = hidden.iter().map(|(_, stems)| stems.len()).sum();
        assert_eq!(total, 11);
    }
}
