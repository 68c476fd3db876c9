use chrono::{Datelike, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod calendar;
pub mod config;
pub mod error;
pub mod formation;
pub mod hidden_stems;
pub mod interactions;
pub mod luck_cycle;
pub mod pillars;
pub mod profile;
pub mod scoring;
pub mod sinsal;
pub mod ten_gods;

pub use calendar::{CalendarService, EphemerisCalendar, SolarInstant};
pub use config::EngineConfig;
pub use error::{Result, SajuError};

use formation::FormationResult;
use hidden_stems::HiddenStems;
use interactions::Interaction;
use luck_cycle::LuckCycle;
use profile::TraitProfile;
use scoring::EventScore;
use sinsal::Sinsal;
use ten_gods::TenGodSummary;

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    #[serde(rename = "木")]
    Wood,
    #[serde(rename = "火")]
    Fire,
    #[serde(rename = "土")]
    Earth,
    #[serde(rename = "金")]
    Metal,
    #[serde(rename = "水")]
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Element {
        Element::ALL[index % 5]
    }

    /// The element this one feeds (Wood → Fire → Earth → Metal → Water → Wood).
    pub fn generates(self) -> Element {
        Element::from_index(self.index() + 1)
    }

    /// The element this one controls (Wood → Earth → Water → Fire → Metal → Wood).
    pub fn overcomes(self) -> Element {
        Element::from_index(self.index() + 2)
    }

    pub fn hanzi(self) -> &'static str {
        match self {
            Element::Wood => "木",
            Element::Fire => "火",
            Element::Earth => "土",
            Element::Metal => "金",
            Element::Water => "水",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hanzi())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Yang,
    Yin,
}

impl Polarity {
    fn from_index(index: usize) -> Polarity {
        if index % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stem {
    #[serde(rename = "甲")]
    Jia,
    #[serde(rename = "乙")]
    Yi,
    #[serde(rename = "丙")]
    Bing,
    #[serde(rename = "丁")]
    Ding,
    #[serde(rename = "戊")]
    Wu,
    #[serde(rename = "己")]
    Ji,
    #[serde(rename = "庚")]
    Geng,
    #[serde(rename = "辛")]
    Xin,
    #[serde(rename = "壬")]
    Ren,
    #[serde(rename = "癸")]
    Gui,
}

const STEM_HANZI: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Stem {
        Stem::ALL[index % 10]
    }

    /// Steps forward (or backward, for negative `steps`) around the cycle of ten.
    pub fn offset(self, steps: i64) -> Stem {
        Stem::from_index((self.index() as i64 + steps).rem_euclid(10) as usize)
    }

    pub fn element(self) -> Element {
        Element::from_index(self.index() / 2)
    }

    pub fn polarity(self) -> Polarity {
        Polarity::from_index(self.index())
    }

    pub fn hanzi(self) -> char {
        STEM_HANZI[self.index()]
    }

    pub fn from_hanzi(c: char) -> Option<Stem> {
        STEM_HANZI.iter().position(|&h| h == c).map(Stem::from_index)
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hanzi())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "子")]
    Zi,
    #[serde(rename = "丑")]
    Chou,
    #[serde(rename = "寅")]
    Yin,
    #[serde(rename = "卯")]
    Mao,
    #[serde(rename = "辰")]
    Chen,
    #[serde(rename = "巳")]
    Si,
    #[serde(rename = "午")]
    Wu,
    #[serde(rename = "未")]
    Wei,
    #[serde(rename = "申")]
    Shen,
    #[serde(rename = "酉")]
    You,
    #[serde(rename = "戌")]
    Xu,
    #[serde(rename = "亥")]
    Hai,
}

const BRANCH_HANZI: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water,
    Element::Earth,
    Element::Wood,
    Element::Wood,
    Element::Earth,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Earth,
    Element::Water,
];

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Branch {
        Branch::ALL[index % 12]
    }

    pub fn offset(self, steps: i64) -> Branch {
        Branch::from_index((self.index() as i64 + steps).rem_euclid(12) as usize)
    }

    pub fn element(self) -> Element {
        BRANCH_ELEMENTS[self.index()]
    }

    pub fn polarity(self) -> Polarity {
        Polarity::from_index(self.index())
    }

    pub fn hanzi(self) -> char {
        BRANCH_HANZI[self.index()]
    }

    pub fn from_hanzi(c: char) -> Option<Branch> {
        BRANCH_HANZI.iter().position(|&h| h == c).map(Branch::from_index)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hanzi())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PillarPosition {
    Year,
    Month,
    Day,
    Hour,
}

impl PillarPosition {
    pub const ALL: [PillarPosition; 4] = [
        PillarPosition::Year,
        PillarPosition::Month,
        PillarPosition::Day,
        PillarPosition::Hour,
    ];
}

impl fmt::Display for PillarPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PillarPosition::Year => "year",
            PillarPosition::Month => "month",
            PillarPosition::Day => "day",
            PillarPosition::Hour => "hour",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Structures
// ---------------------------

/// A sexagenary stem/branch pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GanZhi {
    pub stem: Stem,
    pub branch: Branch,
}

impl GanZhi {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        GanZhi { stem, branch }
    }

    /// Pair number `index` of the sixty-cycle, 甲子 = 0.
    pub fn from_cycle_index(index: i64) -> Self {
        GanZhi {
            stem: Stem::from_index(index.rem_euclid(10) as usize),
            branch: Branch::from_index(index.rem_euclid(12) as usize),
        }
    }

    pub fn cycle_index(&self) -> usize {
        (6 * self.stem.index() as i64 - 5 * self.branch.index() as i64).rem_euclid(60) as usize
    }

    /// Pair of the sexagenary year reckoned from the civil year number.
    pub fn of_year(year: i32) -> Self {
        GanZhi::from_cycle_index(i64::from(year) - 4)
    }
}

impl fmt::Display for GanZhi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: Stem,
    pub branch: Branch,
    /// Element of the stem.
    pub element: Element,
}

impl Pillar {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Pillar {
            stem,
            branch,
            element: stem.element(),
        }
    }

    pub fn ganzhi(&self) -> GanZhi {
        GanZhi::new(self.stem, self.branch)
    }
}

impl From<GanZhi> for Pillar {
    fn from(ganzhi: GanZhi) -> Self {
        Pillar::new(ganzhi.stem, ganzhi.branch)
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

/// The four pillars of a birth instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
}

impl Chart {
    pub fn new(year: GanZhi, month: GanZhi, day: GanZhi, hour: GanZhi) -> Self {
        Chart {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            hour: hour.into(),
        }
    }

    /// Builds a chart from four two-character pillars such as `"庚午"`.
    pub fn from_hanzi(year: &str, month: &str, day: &str, hour: &str) -> Option<Self> {
        fn parse(s: &str) -> Option<GanZhi> {
            let mut chars = s.chars();
            let stem = Stem::from_hanzi(chars.next()?)?;
            let branch = Branch::from_hanzi(chars.next()?)?;
            match chars.next() {
                None => Some(GanZhi::new(stem, branch)),
                Some(_) => None,
            }
        }
        Some(Chart::new(parse(year)?, parse(month)?, parse(day)?, parse(hour)?))
    }

    /// The day stem, reference point of every relational classification.
    pub fn day_master(&self) -> Stem {
        self.day.stem
    }

    pub fn pillar(&self, position: PillarPosition) -> &Pillar {
        match position {
            PillarPosition::Year => &self.year,
            PillarPosition::Month => &self.month,
            PillarPosition::Day => &self.day,
            PillarPosition::Hour => &self.hour,
        }
    }

    pub fn pillars(&self) -> impl Iterator<Item = (PillarPosition, &Pillar)> {
        PillarPosition::ALL
            .into_iter()
            .map(move |position| (position, self.pillar(position)))
    }

    pub fn branches(&self) -> [Branch; 4] {
        [
            self.year.branch,
            self.month.branch,
            self.day.branch,
            self.hour.branch,
        ]
    }

    /// Visible stems other than the day master.
    pub fn outer_stems(&self) -> [(PillarPosition, Stem); 3] {
        [
            (PillarPosition::Year, self.year.stem),
            (PillarPosition::Month, self.month.stem),
            (PillarPosition::Hour, self.hour.stem),
        ]
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.month, self.day, self.hour)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarKind {
    Solar,
    Lunar { is_leap_month: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthInfo {
    /// Civil year, month and day; lunar numbering when `calendar` is lunar.
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Local time of day.
    pub time: NaiveTime,
    /// UTC offset string such as `"GMT+9"`.
    pub timezone: String,
    pub calendar: CalendarKind,
    pub gender: Gender,
}

impl BirthInfo {
    pub fn solar(date_time: NaiveDateTime, timezone: &str, gender: Gender) -> Self {
        BirthInfo {
            year: date_time.year(),
            month: date_time.month(),
            day: date_time.day(),
            time: date_time.time(),
            timezone: timezone.to_string(),
            calendar: CalendarKind::Solar,
            gender,
        }
    }

    pub fn lunar(
        year: i32,
        month: u32,
        day: u32,
        is_leap_month: bool,
        time: NaiveTime,
        timezone: &str,
        gender: Gender,
    ) -> Self {
        BirthInfo {
            year,
            month,
            day,
            time,
            timezone: timezone.to_string(),
            calendar: CalendarKind::Lunar { is_leap_month },
            gender,
        }
    }

    pub fn generate_report(&self, target_year: Option<i32>) -> Result<Report> {
        let engine = SajuEngine::new(EphemerisCalendar, EngineConfig::default());
        Report::calculate(self, &engine, target_year)
    }
}

/// Calculation service: a calendar collaborator plus the tunable policy.
#[derive(Debug, Clone)]
pub struct SajuEngine<C: CalendarService> {
    calendar: C,
    config: EngineConfig,
}

impl<C: CalendarService> SajuEngine<C> {
    pub fn new(calendar: C, config: EngineConfig) -> Self {
        SajuEngine { calendar, config }
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub birth_info: BirthInfo,
    pub solar_instant: SolarInstant,
    pub chart: Chart,
    pub hidden_stems: HiddenStems,
    pub ten_gods: TenGodSummary,
    pub interactions: Vec<Interaction>,
    pub interaction_balance: f64,
    pub sinsal: Vec<Sinsal>,
    pub formation: FormationResult,
    pub luck_cycle: LuckCycle,
    pub traits: TraitProfile,
    pub event_score: Option<EventScore>,
}

impl Report {
    pub fn calculate<C: CalendarService>(
        birth_info: &BirthInfo,
        engine: &SajuEngine<C>,
        target_year: Option<i32>,
    ) -> Result<Self> {
        let config = engine.config();

        // Resolve the birth instant and the four pillars
        let solar_instant = engine.resolve_birth_instant(birth_info)?;
        let chart = engine.calculate_chart(&solar_instant)?;

        // Static lookups and classifications
        let hidden_stems = HiddenStems::of_chart(&chart);
        let ten_gods = TenGodSummary::from_chart(&chart, &hidden_stems);
        let interactions = interactions::analyze_chart(&chart);
        let interaction_balance = interactions::interaction_balance(&interactions);
        let sinsal = sinsal::detect(&chart);

        // Formation
        let formation =
            formation::classify(&chart, &hidden_stems, &ten_gods.counts, &config.formation);
        tracing::debug!(formation = %formation, "formation classified");

        // Luck cycles
        let luck_cycle =
            engine.calculate_luck_cycle(&chart, &solar_instant, birth_info.gender)?;

        let traits = TraitProfile::calculate(&chart, &hidden_stems);

        let event_score = target_year.map(|year| {
            scoring::score_event(
                &chart,
                &formation,
                &sinsal,
                &interactions,
                Some(year),
                &config.scoring,
            )
        });

        Ok(Self {
            birth_info: birth_info.clone(),
            solar_instant,
            chart,
            hidden_stems,
            ten_gods,
            interactions,
            interaction_balance,
            sinsal,
            formation,
            luck_cycle,
            traits,
            event_score,
        })
    }

    /// Civil birth year the luck-cycle start years count from.
    pub fn birth_year(&self) -> i32 {
        self.solar_instant.local().year()
    }
}
