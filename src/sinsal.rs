use super::*;

// ---------------------------
// ## Markers
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinsalKind {
    HeavenlyNoble,
    LiteraryStar,
    PeachBlossom,
    TravelingHorse,
    Canopy,
    Void,
    CommandingStar,
    YangBlade,
    Prosperity,
    HeavenlyVirtue,
    MonthlyVirtue,
    HeavenlyDoctor,
    WhiteTiger,
}

impl SinsalKind {
    pub const ALL: [SinsalKind; 13] = [
        SinsalKind::HeavenlyNoble,
        SinsalKind::LiteraryStar,
        SinsalKind::PeachBlossom,
        SinsalKind::TravelingHorse,
        SinsalKind::Canopy,
        SinsalKind::Void,
        SinsalKind::CommandingStar,
        SinsalKind::YangBlade,
        SinsalKind::Prosperity,
        SinsalKind::HeavenlyVirtue,
        SinsalKind::MonthlyVirtue,
        SinsalKind::HeavenlyDoctor,
        SinsalKind::WhiteTiger,
    ];

    pub fn weight(self) -> f64 {
        match self {
            SinsalKind::HeavenlyNoble => 0.9,
            SinsalKind::LiteraryStar => 0.7,
            SinsalKind::PeachBlossom => 0.7,
            SinsalKind::TravelingHorse => 0.6,
            SinsalKind::Canopy => 0.5,
            SinsalKind::Void => 0.6,
            SinsalKind::CommandingStar => 0.8,
            SinsalKind::YangBlade => 0.7,
            SinsalKind::Prosperity => 0.8,
            SinsalKind::HeavenlyVirtue => 0.8,
            SinsalKind::MonthlyVirtue => 0.7,
            SinsalKind::HeavenlyDoctor => 0.6,
            SinsalKind::WhiteTiger => 0.8,
        }
    }

    pub fn is_lucky(self) -> bool {
        matches!(
            self,
            SinsalKind::HeavenlyNoble
                | SinsalKind::LiteraryStar
                | SinsalKind::CommandingStar
                | SinsalKind::Prosperity
                | SinsalKind::HeavenlyVirtue
                | SinsalKind::MonthlyVirtue
                | SinsalKind::HeavenlyDoctor
        )
    }

    pub fn hanzi(self) -> &'static str {
        match self {
            SinsalKind::HeavenlyNoble => "天乙貴人",
            SinsalKind::LiteraryStar => "文昌",
            SinsalKind::PeachBlossom => "桃花",
            SinsalKind::TravelingHorse => "驛馬",
            SinsalKind::Canopy => "華蓋",
            SinsalKind::Void => "空亡",
            SinsalKind::CommandingStar => "魁罡",
            SinsalKind::YangBlade => "羊刃",
            SinsalKind::Prosperity => "建祿",
            SinsalKind::HeavenlyVirtue => "天德貴人",
            SinsalKind::MonthlyVirtue => "月德貴人",
            SinsalKind::HeavenlyDoctor => "天醫",
            SinsalKind::WhiteTiger => "白虎",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            SinsalKind::HeavenlyNoble => "Heavenly Noble",
            SinsalKind::LiteraryStar => "Literary Star",
            SinsalKind::PeachBlossom => "Peach Blossom",
            SinsalKind::TravelingHorse => "Traveling Horse",
            SinsalKind::Canopy => "Canopy",
            SinsalKind::Void => "Void",
            SinsalKind::CommandingStar => "Commanding Star",
            SinsalKind::YangBlade => "Yang Blade",
            SinsalKind::Prosperity => "Prosperity Star",
            SinsalKind::HeavenlyVirtue => "Heavenly Virtue",
            SinsalKind::MonthlyVirtue => "Monthly Virtue",
            SinsalKind::HeavenlyDoctor => "Heavenly Doctor",
            SinsalKind::WhiteTiger => "White Tiger",
        }
    }
}

impl fmt::Display for SinsalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.english_name(), self.hanzi())
    }
}

/// A marker found at one pillar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sinsal {
    pub kind: SinsalKind,
    pub position: PillarPosition,
    pub weight: f64,
    pub lucky: bool,
}

impl Sinsal {
    pub fn new(kind: SinsalKind, position: PillarPosition) -> Self {
        Sinsal {
            kind,
            position,
            weight: kind.weight(),
            lucky: kind.is_lucky(),
        }
    }

    /// Weight signed by polarity.
    pub fn signed_weight(&self) -> f64 {
        if self.lucky {
            self.weight
        } else {
            -self.weight
        }
    }
}

// ---------------------------
// ## Lookup tables
// ---------------------------

use Branch::*;
use Stem::{Bing, Ding, Geng, Gui, Jia, Ren, Xin};

/// Noble branches per day stem.
const HEAVENLY_NOBLE: [[Branch; 2]; 10] = [
    [Chou, Wei],
    [Zi, Shen],
    [You, Hai],
    [You, Hai],
    [Chou, Wei],
    [Zi, Shen],
    [Chou, Wei],
    [Yin, Wu],
    [Mao, Si],
    [Mao, Si],
];

const LITERARY_STAR: [Branch; 10] = [Si, Wu, Shen, You, Shen, You, Hai, Zi, Yin, Mao];

/// Yang day stems only.
const YANG_BLADE: [Option<Branch>; 10] = [
    Some(Mao),
    None,
    Some(Wu),
    None,
    Some(Wu),
    None,
    Some(You),
    None,
    Some(Zi),
    None,
];

const PROSPERITY: [Branch; 10] = [Yin, Mao, Si, Wu, Si, Wu, Shen, You, Hai, Zi];

// Triad tables indexed by `branch.index() % 4`:
// 申子辰, 巳酉丑, 寅午戌, 亥卯未.
const PEACH_BLOSSOM: [Branch; 4] = [You, Wu, Mao, Zi];
const TRAVELING_HORSE: [Branch; 4] = [Yin, Hai, Shen, Si];
const CANOPY: [Branch; 4] = [Chen, Chou, Xu, Wei];
const MONTHLY_VIRTUE: [Stem; 4] = [Ren, Geng, Bing, Jia];

const COMMANDING_DAYS: [(Stem, Branch); 4] = [(Geng, Chen), (Geng, Xu), (Ren, Chen), (Ren, Xu)];

const WHITE_TIGER: [(Stem, Branch); 7] = [
    (Jia, Chen),
    (Stem::Yi, Wei),
    (Bing, Xu),
    (Ding, Chou),
    (Stem::Wu, Chen),
    (Ren, Xu),
    (Gui, Chou),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum VirtueTarget {
    Stem(Stem),
    Branch(Branch),
}

/// Heavenly Virtue per month branch; four months point at a branch instead of a stem.
const HEAVENLY_VIRTUE: [VirtueTarget; 12] = [
    VirtueTarget::Branch(Si),
    VirtueTarget::Stem(Geng),
    VirtueTarget::Stem(Ding),
    VirtueTarget::Branch(Shen),
    VirtueTarget::Stem(Ren),
    VirtueTarget::Stem(Xin),
    VirtueTarget::Branch(Hai),
    VirtueTarget::Stem(Jia),
    VirtueTarget::Stem(Gui),
    VirtueTarget::Branch(Yin),
    VirtueTarget::Stem(Bing),
    VirtueTarget::Stem(Stem::Yi),
];

fn triad(branch: Branch) -> usize {
    branch.index() % 4
}

/// The two branches missing from the day pillar's ten-day cycle.
pub fn void_branches(day: GanZhi) -> [Branch; 2] {
    let first = Branch::from_index(day.branch.index() + 10 - day.stem.index());
    [first, first.offset(1)]
}

// ---------------------------
// ## Detection
// ---------------------------

/// Evaluates every rule against the chart.
///
/// Hits come out in rule order, then pillar order.
pub fn detect(chart: &Chart) -> Vec<Sinsal> {
    let day_master = chart.day_master();
    let mut found = Vec::new();

    let mark_branches = |found: &mut Vec<Sinsal>, kind: SinsalKind, targets: &[Branch]| {
        for (position, pillar) in chart.pillars() {
            if targets.contains(&pillar.branch) {
                found.push(Sinsal::new(kind, position));
            }
        }
    };

    mark_branches(&mut found, SinsalKind::HeavenlyNoble, &HEAVENLY_NOBLE[day_master.index()]);
    mark_branches(&mut found, SinsalKind::LiteraryStar, &[LITERARY_STAR[day_master.index()]]);

    // Keyed by the year and day branch; only the first hit per base counts.
    let triad_rules = [
        (SinsalKind::PeachBlossom, &PEACH_BLOSSOM),
        (SinsalKind::TravelingHorse, &TRAVELING_HORSE),
        (SinsalKind::Canopy, &CANOPY),
    ];
    for (kind, table) in triad_rules {
        for base in [chart.year.branch, chart.day.branch] {
            let target = table[triad(base)];
            if let Some((position, _)) = chart.pillars().find(|(_, p)| p.branch == target) {
                found.push(Sinsal::new(kind, position));
            }
        }
    }

    mark_branches(&mut found, SinsalKind::Void, &void_branches(chart.day.ganzhi()));

    if COMMANDING_DAYS.contains(&(chart.day.stem, chart.day.branch)) {
        found.push(Sinsal::new(SinsalKind::CommandingStar, PillarPosition::Day));
    }

    if let Some(blade) = YANG_BLADE[day_master.index()] {
        mark_branches(&mut found, SinsalKind::YangBlade, &[blade]);
    }
    mark_branches(&mut found, SinsalKind::Prosperity, &[PROSPERITY[day_master.index()]]);

    let month_branch = chart.month.branch;
    match HEAVENLY_VIRTUE[month_branch.index()] {
        VirtueTarget::Stem(stem) => {
            for (position, pillar) in chart.pillars() {
                if pillar.stem == stem {
                    found.push(Sinsal::new(SinsalKind::HeavenlyVirtue, position));
                }
            }
        }
        VirtueTarget::Branch(branch) => {
            mark_branches(&mut found, SinsalKind::HeavenlyVirtue, &[branch]);
        }
    }

    let monthly_virtue = MONTHLY_VIRTUE[triad(month_branch)];
    for (position, pillar) in chart.pillars() {
        if pillar.stem == monthly_virtue {
            found.push(Sinsal::new(SinsalKind::MonthlyVirtue, position));
        }
    }

    let doctor = month_branch.offset(-1);
    for (position, pillar) in chart.pillars() {
        if position != PillarPosition::Month && pillar.branch == doctor {
            found.push(Sinsal::new(SinsalKind::HeavenlyDoctor, position));
        }
    }

    for (position, pillar) in chart.pillars() {
        if WHITE_TIGER.contains(&(pillar.stem, pillar.branch)) {
            found.push(Sinsal::new(SinsalKind::WhiteTiger, position));
        }
    }

    found
}

/// `"Lucky: ... | Unlucky: ..."`, or a fixed phrase when nothing fired.
pub fn summarize(sinsal: &[Sinsal]) -> String {
    if sinsal.is_empty() {
        return "no notable markers".to_string();
    }
    let names = |lucky: bool| {
        sinsal
            .iter()
            .filter(|s| s.lucky == lucky)
            .map(|s| s.kind.english_name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut parts = Vec::new();
    let lucky = names(true);
    if !lucky.is_empty() {
        parts.push(format!("Lucky: {}", lucky));
    }
    let unlucky = names(false);
    if !unlucky.is_empty() {
        parts.push(format!("Unlucky: {}", unlucky));
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds_at(found: &[Sinsal], kind: SinsalKind) -> Vec<PillarPosition> {
        found
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.position)
            .collect()
    }

    #[test]
    fn test_void_branches() {
        let void = |s: &str| {
            let chart = Chart::from_hanzi(s, s, s, s).unwrap();
            void_branches(chart.day.ganzhi())
        };
        assert_eq!(void("甲子"), [Xu, Hai]);
        assert_eq!(void("癸酉"), [Xu, Hai]);
        assert_eq!(void("庚辰"), [Shen, You]);
        assert_eq!(void("甲午"), [Chen, Si]);
        assert_eq!(void("癸亥"), [Zi, Chou]);
    }

    #[test]
    fn test_reference_chart() {
        let chart = Chart::from_hanzi("庚午", "辛巳", "庚辰", "癸未").unwrap();
        let found = detect(&chart);

        let kinds: Vec<_> = found.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SinsalKind::HeavenlyNoble,
                SinsalKind::Canopy,
                SinsalKind::CommandingStar,
                SinsalKind::HeavenlyVirtue,
                SinsalKind::MonthlyVirtue,
                SinsalKind::MonthlyVirtue,
                SinsalKind::HeavenlyDoctor,
            ]
        );
        assert_eq!(kinds_at(&found, SinsalKind::HeavenlyNoble), vec![PillarPosition::Hour]);
        assert_eq!(kinds_at(&found, SinsalKind::Canopy), vec![PillarPosition::Day]);
        assert_eq!(kinds_at(&found, SinsalKind::HeavenlyVirtue), vec![PillarPosition::Month]);
        assert_eq!(
            kinds_at(&found, SinsalKind::MonthlyVirtue),
            vec![PillarPosition::Year, PillarPosition::Day]
        );
        assert_eq!(kinds_at(&found, SinsalKind::HeavenlyDoctor), vec![PillarPosition::Day]);

        let net: f64 = found.iter().map(Sinsal::signed_weight).sum();
        assert_relative_eq!(net, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_triad_rules_keep_first_hit_per_base() {
        // Year 子 and day 辰 share the 申子辰 triad: peach blossom 酉 at month and hour.
        let chart = Chart::from_hanzi("甲子", "癸酉", "丙辰", "丁酉").unwrap();
        let found = detect(&chart);
        assert_eq!(
            kinds_at(&found, SinsalKind::PeachBlossom),
            vec![PillarPosition::Month, PillarPosition::Month]
        );
        assert_eq!(
            kinds_at(&found, SinsalKind::Canopy),
            vec![PillarPosition::Day, PillarPosition::Day]
        );
        assert!(kinds_at(&found, SinsalKind::TravelingHorse).is_empty());
    }

    #[test]
    fn test_yang_blade_only_for_yang_day_stems() {
        let yang = Chart::from_hanzi("甲子", "丁卯", "甲寅", "丙寅").unwrap();
        let found = detect(&yang);
        assert_eq!(kinds_at(&found, SinsalKind::YangBlade), vec![PillarPosition::Month]);
        assert_eq!(
            kinds_at(&found, SinsalKind::Prosperity),
            vec![PillarPosition::Day, PillarPosition::Hour]
        );

        let yin = Chart::from_hanzi("甲子", "丁卯", "乙卯", "丙寅").unwrap();
        assert!(kinds_at(&detect(&yin), SinsalKind::YangBlade).is_empty());
    }

    #[test]
    fn test_heavenly_virtue_branch_target() {
        // 卯 month points at the branch 申.
        let chart = Chart::from_hanzi("甲申", "丁卯", "丙子", "戊子").unwrap();
        assert_eq!(
            kinds_at(&detect(&chart), SinsalKind::HeavenlyVirtue),
            vec![PillarPosition::Year]
        );
    }

    #[test]
    fn test_white_tiger_on_any_pillar() {
        let chart = Chart::from_hanzi("甲辰", "丁丑", "庚子", "壬戌").unwrap();
        assert_eq!(
            kinds_at(&detect(&chart), SinsalKind::WhiteTiger),
            vec![PillarPosition::Year, PillarPosition::Month, PillarPosition::Hour]
        );
    }

    #[test]
    fn test_polarity_and_summary() {
        assert!(Sinsal::new(SinsalKind::HeavenlyNoble, PillarPosition::Day).lucky);
        let void = Sinsal::new(SinsalKind::Void, PillarPosition::Hour);
        assert!(!void.lucky);
        assert_relative_eq!(void.signed_weight(), -0.6);

        assert_eq!(summarize(&[]), "no notable markers");
        let chart = Chart::from_hanzi("庚午", "辛巳", "庚辰", "癸未").unwrap();
        assert_eq!(
            summarize(&detect(&chart)),
            "Lucky: Heavenly Noble, Commanding Star, Heavenly Virtue, Monthly Virtue, \
             Monthly Virtue, Heavenly Doctor | Unlucky: Canopy"
        );
    }
}
