use lazy_static::lazy_static;
use std::collections::HashMap;

use super::*;

// ---------------------------
// ## Kinds
// ---------------------------

/// Branch relation kinds, listed in precedence order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Combination,
    Clash,
    Punishment,
    Harm,
    Destruction,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 5] = [
        InteractionKind::Combination,
        InteractionKind::Clash,
        InteractionKind::Punishment,
        InteractionKind::Harm,
        InteractionKind::Destruction,
    ];

    pub fn hanzi(self) -> &'static str {
        match self {
            InteractionKind::Combination => "六合",
            InteractionKind::Clash => "沖",
            InteractionKind::Punishment => "刑",
            InteractionKind::Harm => "害",
            InteractionKind::Destruction => "破",
        }
    }

    /// Multiplier applied to a relation's weight in the natal harmony balance.
    pub fn balance_factor(self) -> f64 {
        match self {
            InteractionKind::Combination => 1.0,
            InteractionKind::Clash => -1.4,
            InteractionKind::Punishment => -1.5,
            InteractionKind::Harm => -0.8,
            InteractionKind::Destruction => -0.5,
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InteractionKind::Combination => "combination",
            InteractionKind::Clash => "clash",
            InteractionKind::Punishment => "punishment",
            InteractionKind::Harm => "harm",
            InteractionKind::Destruction => "destruction",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------
// ## Relation tables
// ---------------------------

/// One table row matching an unordered branch pair.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Relation {
    pub kind: InteractionKind,
    pub weight: f64,
    /// Element produced, for combinations only.
    pub element: Option<Element>,
}

use Branch::*;

const COMBINATIONS: [(Branch, Branch, Element, f64); 6] = [
    (Zi, Chou, Element::Earth, 0.9),
    (Yin, Hai, Element::Wood, 0.9),
    (Mao, Xu, Element::Fire, 0.8),
    (Chen, You, Element::Metal, 0.8),
    (Si, Shen, Element::Water, 0.8),
    (Wu, Wei, Element::Fire, 0.7),
];

const CLASHES: [(Branch, Branch, f64); 6] = [
    (Zi, Wu, 1.0),
    (Chou, Wei, 0.9),
    (Yin, Shen, 1.0),
    (Mao, You, 1.0),
    (Chen, Xu, 0.9),
    (Si, Hai, 1.0),
];

const PUNISHMENTS: [(Branch, Branch, f64); 11] = [
    // ungrateful
    (Yin, Si, 0.8),
    (Si, Shen, 0.8),
    (Shen, Yin, 0.8),
    // bullying
    (Chou, Xu, 0.7),
    (Xu, Wei, 0.7),
    (Wei, Chou, 0.7),
    // uncivil
    (Zi, Mao, 0.6),
    // self
    (Chen, Chen, 0.5),
    (Wu, Wu, 0.5),
    (You, You, 0.5),
    (Hai, Hai, 0.5),
];

const HARMS: [(Branch, Branch, f64); 6] = [
    (Zi, Wei, 0.7),
    (Chou, Wu, 0.7),
    (Yin, Si, 0.6),
    (Mao, Chen, 0.5),
    (Shen, Hai, 0.6),
    (You, Xu, 0.5),
];

const DESTRUCTIONS: [(Branch, Branch, f64); 6] = [
    (Zi, You, 0.5),
    (Chou, Chen, 0.5),
    (Yin, Hai, 0.4),
    (Mao, Wu, 0.5),
    (Si, Shen, 0.4),
    (Wei, Xu, 0.5),
];

fn pair_key(a: Branch, b: Branch) -> (Branch, Branch) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

lazy_static! {
    static ref RELATION_TABLE: HashMap<(Branch, Branch), Vec<Relation>> = {
        let mut table: HashMap<(Branch, Branch), Vec<Relation>> = HashMap::new();
        let mut insert = |a: Branch, b: Branch, relation: Relation| {
            table.entry(pair_key(a, b)).or_default().push(relation);
        };

        // Insertion follows precedence order, so each row list stays sorted by kind.
        for (a, b, element, weight) in COMBINATIONS {
            insert(a, b, Relation { kind: InteractionKind::Combination, weight, element: Some(element) });
        }
        let plain = [
            (InteractionKind::Clash, &CLASHES[..]),
            (InteractionKind::Punishment, &PUNISHMENTS[..]),
            (InteractionKind::Harm, &HARMS[..]),
            (InteractionKind::Destruction, &DESTRUCTIONS[..]),
        ];
        for (kind, rows) in plain {
            for &(a, b, weight) in rows {
                insert(a, b, Relation { kind, weight, element: None });
            }
        }
        table
    };
}

/// Every relation between two branches, in precedence order. Symmetric.
pub fn relations_between(a: Branch, b: Branch) -> &'static [Relation] {
    RELATION_TABLE
        .get(&pair_key(a, b))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The highest-precedence relation between two branches, if any.
pub fn strongest_relation(a: Branch, b: Branch) -> Option<Relation> {
    relations_between(a, b).first().copied()
}

// ---------------------------
// ## Detected interactions
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub branches: (Branch, Branch),
    pub weight: f64,
    pub result_element: Option<Element>,
    /// Chart positions of the two branches; `None` for ad hoc pairs.
    pub positions: Option<(PillarPosition, PillarPosition)>,
}

impl Interaction {
    fn from_relation(a: Branch, b: Branch, relation: &Relation) -> Self {
        Interaction {
            kind: relation.kind,
            branches: (a, b),
            weight: relation.weight,
            result_element: relation.element,
            positions: None,
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {}", self.branches.0, self.branches.1, self.kind)?;
        if let Some(element) = self.result_element {
            write!(f, " ({})", element)?;
        }
        if let Some((a, b)) = self.positions {
            write!(f, " [{}-{}]", a, b)?;
        }
        Ok(())
    }
}

/// Relations between two arbitrary branches, e.g. a year branch against a natal one.
pub fn between(a: Branch, b: Branch) -> Vec<Interaction> {
    relations_between(a, b)
        .iter()
        .map(|relation| Interaction::from_relation(a, b, relation))
        .collect()
}

/// Checks every unordered pair of chart positions against every table.
///
/// Output is ordered by position pair (year-month, year-day, ... day-hour) and,
/// within a pair, by kind precedence.
pub fn analyze_chart(chart: &Chart) -> Vec<Interaction> {
    let positions = PillarPosition::ALL;
    let mut found = Vec::new();
    for (i, &first) in positions.iter().enumerate() {
        for &second in &positions[i + 1..] {
            let a = chart.pillar(first).branch;
            let b = chart.pillar(second).branch;
            for relation in relations_between(a, b) {
                let mut interaction = Interaction::from_relation(a, b, relation);
                interaction.positions = Some((first, second));
                found.push(interaction);
            }
        }
    }
    found
}

/// Natal harmony: combinations add their weight, the other kinds subtract a multiple.
pub fn interaction_balance(interactions: &[Interaction]) -> f64 {
    let balance: f64 = interactions
        .iter()
        .map(|interaction| interaction.weight * interaction.kind.balance_factor())
        .sum();
    ten_gods::round2(balance)
}
