//! Weighted multi-criteria rubric.
//!
//! Every thought is rated on the same closed set of ten [`Criterion`] values.
//! The [`ScoringEngine`] validates a raw name → score map against that schema
//! and collapses it into one weighted total.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::error::SchemaError;

/// Number of criteria in the canonical schema.
pub const CRITERIA_COUNT: usize = 10;

/// Lowest score a criterion can take.
pub const MIN_SCORE: f64 = 1.0;

/// Highest score a criterion can take.
pub const MAX_SCORE: f64 = 10.0;

const BASIS_POINTS_TOTAL: u32 = 10_000;

/// The ten rubric criteria, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// How well the approach reaches the stated goal.
    GoalAchievement,
    /// Technical feasibility.
    Feasibility,
    /// Implementation effort (higher is less effort).
    Effort,
    /// Long-term maintainability.
    Maintainability,
    /// Risk exposure (higher is less risky).
    Risk,
    /// Return on investment.
    Roi,
    /// Novelty of the approach.
    Innovation,
    /// Security posture.
    Security,
    /// Fit with the team's skills.
    TeamFit,
    /// User experience.
    Ux,
}

impl Criterion {
    /// All criteria in canonical order.
    pub const ALL: [Criterion; CRITERIA_COUNT] = [
        Criterion::GoalAchievement,
        Criterion::Feasibility,
        Criterion::Effort,
        Criterion::Maintainability,
        Criterion::Risk,
        Criterion::Roi,
        Criterion::Innovation,
        Criterion::Security,
        Criterion::TeamFit,
        Criterion::Ux,
    ];

    /// Get the criterion name as used in score maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::GoalAchievement => "goal_achievement",
            Criterion::Feasibility => "feasibility",
            Criterion::Effort => "effort",
            Criterion::Maintainability => "maintainability",
            Criterion::Risk => "risk",
            Criterion::Roi => "roi",
            Criterion::Innovation => "innovation",
            Criterion::Security => "security",
            Criterion::TeamFit => "team_fit",
            Criterion::Ux => "ux",
        }
    }

    /// Position of the criterion in the canonical order.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Canonical schema as owned names, in order.
    pub fn schema() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown criterion: {}", s))
    }
}

/// Per-criterion weights, stored in basis points so that the sum is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionWeights {
    basis_points: [u32; CRITERIA_COUNT],
}

impl CriterionWeights {
    /// The default rubric: goal achievement first, UX last.
    pub const DEFAULT: CriterionWeights = CriterionWeights {
        basis_points: [1500, 1200, 1200, 1100, 1100, 1000, 800, 800, 700, 600],
    };

    /// Build an alternate rubric. Every weight must be positive and the total
    /// must be exactly 10 000 basis points.
    pub fn from_basis_points(basis_points: [u32; CRITERIA_COUNT]) -> Result<Self, SchemaError> {
        if let Some(c) = Criterion::ALL.iter().find(|c| basis_points[c.index()] == 0) {
            return Err(SchemaError::InvalidWeights {
                message: format!("weight for {} must be positive", c),
            });
        }
        let total: u32 = basis_points.iter().sum();
        if total != BASIS_POINTS_TOTAL {
            return Err(SchemaError::InvalidWeights {
                message: format!("weights sum to {} basis points, expected 10000", total),
            });
        }
        Ok(Self { basis_points })
    }

    /// Weight of one criterion as a fraction of 1.0.
    pub fn weight(&self, criterion: Criterion) -> f64 {
        f64::from(self.basis_points[criterion.index()]) / f64::from(BASIS_POINTS_TOTAL)
    }

    /// Total of all weights in basis points (10 000 == 1.0).
    pub fn total_basis_points(&self) -> u32 {
        self.basis_points.iter().sum()
    }
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A validated score vector: exactly one value in [1,10] per criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaScores {
    values: [f64; CRITERIA_COUNT],
}

impl CriteriaScores {
    /// Score for one criterion.
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.values[criterion.index()]
    }

    /// Iterate `(criterion, score)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        Criterion::ALL.iter().map(move |c| (*c, self.values[c.index()]))
    }

    /// Copy with a uniform delta applied to every criterion, clamped to [1,10].
    pub fn shifted(&self, delta: f64) -> Self {
        let mut values = self.values;
        for v in values.iter_mut() {
            *v = (*v + delta).clamp(MIN_SCORE, MAX_SCORE);
        }
        Self { values }
    }
}

impl Serialize for CriteriaScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CRITERIA_COUNT))?;
        for (criterion, value) in self.iter() {
            map.serialize_entry(criterion.as_str(), &value)?;
        }
        map.end()
    }
}

/// Converts criterion scores into a single weighted total.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringEngine {
    weights: CriterionWeights,
}

impl ScoringEngine {
    /// Create an engine over the given rubric
    pub fn new(weights: CriterionWeights) -> Self {
        Self { weights }
    }

    /// The rubric this engine scores with.
    pub fn weights(&self) -> &CriterionWeights {
        &self.weights
    }

    /// Check a raw score map against the canonical schema.
    ///
    /// Key mismatches are reported before range violations; both lists in a
    /// mismatch are in deterministic order.
    pub fn validate(&self, scores: &HashMap<String, f64>) -> Result<CriteriaScores, SchemaError> {
        let missing: Vec<String> = Criterion::ALL
            .iter()
            .filter(|c| !scores.contains_key(c.as_str()))
            .map(|c| c.as_str().to_string())
            .collect();
        let mut extra: Vec<String> = scores
            .keys()
            .filter(|k| k.parse::<Criterion>().is_err())
            .cloned()
            .collect();
        extra.sort();

        if !missing.is_empty() || !extra.is_empty() {
            return Err(SchemaError::CriteriaMismatch { missing, extra });
        }

        let mut values = [0.0; CRITERIA_COUNT];
        for criterion in Criterion::ALL {
            let value = scores[criterion.as_str()];
            if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(SchemaError::OutOfRange {
                    criterion: criterion.as_str().to_string(),
                    value,
                });
            }
            values[criterion.index()] = value;
        }

        Ok(CriteriaScores { values })
    }

    /// Weighted total of a validated score vector.
    pub fn score(&self, scores: &CriteriaScores) -> f64 {
        scores
            .iter()
            .map(|(criterion, value)| value * self.weights.weight(criterion))
            .sum()
    }

    /// Validate, then score, a raw score map.
    pub fn score_map(&self, scores: &HashMap<String, f64>) -> Result<f64, SchemaError> {
        let validated = self.validate(scores)?;
        Ok(self.score(&validated))
    }
}

#[cfg(test)]
pub(crate) fn uniform_scores(value: f64) -> HashMap<String, f64> {
    Criterion::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), value))
        .collect()
}
