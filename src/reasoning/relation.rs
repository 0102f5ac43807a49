//! Pairwise relation classification between thoughts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::thought::Thought;

/// Default total-score gap above which one thought is `better_than` another.
pub const DEFAULT_SCORE_GAP: f64 = 2.0;

/// Kind of relation between two thoughts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The two thoughts cover different parts of the problem.
    Complements,
    /// The thoughts pull in incompatible directions.
    Contradicts,
    /// One thought needs the other in place first.
    DependsOn,
    /// The thoughts can be merged into a single approach.
    Combinable,
    /// One thought scores clearly higher than the other.
    BetterThan,
}

impl RelationKind {
    /// Snake-case label used on forward edges
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Complements => "complements",
            RelationKind::Contradicts => "contradicts",
            RelationKind::DependsOn => "depends_on",
            RelationKind::Combinable => "combinable",
            RelationKind::BetterThan => "better_than",
        }
    }

    /// Fixed edge strength for this kind, from 1 (weakest) to 5.
    pub fn strength(&self) -> u8 {
        match self {
            RelationKind::Combinable => 5,
            RelationKind::Complements => 4,
            RelationKind::BetterThan => 3,
            RelationKind::DependsOn => 2,
            RelationKind::Contradicts => 1,
        }
    }

    /// Label of the reverse edge, e.g. `inverse_better_than`.
    pub fn inverse_label(&self) -> String {
        format!("inverse_{}", self.as_str())
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complements" => Ok(RelationKind::Complements),
            "contradicts" => Ok(RelationKind::Contradicts),
            "depends_on" => Ok(RelationKind::DependsOn),
            "combinable" => Ok(RelationKind::Combinable),
            "better_than" => Ok(RelationKind::BetterThan),
            _ => Err(format!("Unknown relation kind: {}", s)),
        }
    }
}

/// Outcome of classifying one unordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: RelationKind,
    /// Edge weight, from 1 to 5.
    pub strength: u8,
    /// Id of the stronger thought; only set for `better_than`.
    pub winner: Option<String>,
}

impl Classification {
    /// Classification of `kind` with its table strength and no winner.
    pub fn of(kind: RelationKind) -> Self {
        Self {
            kind,
            strength: kind.strength(),
            winner: None,
        }
    }

    /// `better_than` in favour of `winner`.
    pub fn better_than(winner: impl Into<String>) -> Self {
        Self {
            winner: Some(winner.into()),
            ..Self::of(RelationKind::BetterThan)
        }
    }
}

/// Decides how two thoughts relate. Called once per unordered pair.
pub trait RelationClassifier: Send + Sync {
    /// Classify the pair `(a, b)`, with `a` the earlier thought in graph order.
    fn classify(&self, a: &Thought, b: &Thought) -> Classification;
}

/// Content rule: `a` mentions `first` and `b` mentions `second`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    /// Substring looked up in the first thought's summary.
    pub first: String,
    /// Substring looked up in the second thought's summary.
    pub second: String,
    /// Relation assigned when both substrings match.
    pub kind: RelationKind,
}

impl KeywordRule {
    /// Create a rule relating `first` to `second` as `kind`
    pub fn new(first: impl Into<String>, second: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            kind,
        }
    }

    fn matches(&self, a: &Thought, b: &Thought) -> bool {
        a.summary().contains(&self.first) && b.summary().contains(&self.second)
    }
}

/// Built-in content rules: an API pairs well with a chat bot, a server
/// architecture clashes with a PWA.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("API", "Bot", RelationKind::Combinable),
        KeywordRule::new("Server", "PWA", RelationKind::Contradicts),
    ]
}

/// Keyword rules only; `complements` when no rule fires.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
}

impl KeywordClassifier {
    /// Create a classifier that applies `rules` in order
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    fn first_match(&self, a: &Thought, b: &Thought) -> Option<RelationKind> {
        self.rules.iter().find(|r| r.matches(a, b)).map(|r| r.kind)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl RelationClassifier for KeywordClassifier {
    fn classify(&self, a: &Thought, b: &Thought) -> Classification {
        Classification::of(self.first_match(a, b).unwrap_or(RelationKind::Complements))
    }
}

/// Score gap first, then keyword rules, then `complements`.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    score_gap: f64,
    keywords: KeywordClassifier,
}

impl ThresholdClassifier {
    /// Create a classifier with the given gap and the built-in keyword rules
    pub fn new(score_gap: f64) -> Self {
        Self {
            score_gap,
            keywords: KeywordClassifier::default(),
        }
    }

    /// Replace the keyword rules
    pub fn with_rules(mut self, rules: Vec<KeywordRule>) -> Self {
        self.keywords = KeywordClassifier::new(rules);
        self
    }

    /// Minimum score difference for `better_than`
    pub fn score_gap(&self) -> f64 {
        self.score_gap
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_GAP)
    }
}

impl RelationClassifier for ThresholdClassifier {
    fn classify(&self, a: &Thought, b: &Thought) -> Classification {
        let gap = a.total_score() - b.total_score();
        if gap.abs() > self.score_gap {
            let winner = if gap > 0.0 { a.id() } else { b.id() };
            return Classification::better_than(winner);
        }
        self.keywords.classify(a, b)
    }
}
