use serde::Serialize;

use super::scoring::{CriteriaScores, ScoringEngine};

/// A scored candidate solution.
///
/// The total score is computed once at construction and cannot be changed
/// afterwards; deriving a variant always produces a new `Thought`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thought {
    id: String,
    summary: String,
    criteria_scores: CriteriaScores,
    total_score: f64,
}

impl Thought {
    /// Create a thought from an already validated score vector.
    pub fn new(
        id: impl Into<String>,
        summary: impl Into<String>,
        criteria_scores: CriteriaScores,
        engine: &ScoringEngine,
    ) -> Self {
        let total_score = engine.score(&criteria_scores);
        Self {
            id: id.into(),
            summary: summary.into(),
            criteria_scores,
            total_score,
        }
    }

    /// Unique identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Free-text description.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Per-criterion scores.
    pub fn criteria_scores(&self) -> &CriteriaScores {
        &self.criteria_scores
    }

    /// Weighted total score.
    #[inline]
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    /// Derive a child variant with every criterion shifted by `delta`.
    pub fn variant(
        &self,
        id: impl Into<String>,
        summary: impl Into<String>,
        delta: f64,
        engine: &ScoringEngine,
    ) -> Thought {
        Thought::new(id, summary, self.criteria_scores.shifted(delta), engine)
    }
}

/// Sort thoughts by total score, highest first. Equal scores keep their order.
pub fn rank_descending(thoughts: &mut [Thought]) {
    thoughts.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::scoring::uniform_scores;

    fn thought(id: &str, value: f64) -> Thought {
        let engine = ScoringEngine::default();
        let scores = engine.validate(&uniform_scores(value)).unwrap();
        Thought::new(id, format!("summary {}", id), scores, &engine)
    }

    #[test]
    fn test_total_score_is_derived() {
        let t = thought("T1", 7.0);
        assert!((t.total_score() - 7.0).abs() < 1e-9);
        assert_eq!(t.id(), "T1");
        assert_eq!(t.summary(), "summary T1");
    }

    #[test]
    fn test_variant_does_not_touch_parent() {
        let engine = ScoringEngine::default();
        let parent = thought("T1", 7.0);
        let child = parent.variant("T1-L2-3", "child", 0.5, &engine);

        assert!((parent.total_score() - 7.0).abs() < 1e-9);
        assert!((child.total_score() - 7.5).abs() < 1e-9);
        assert_eq!(child.id(), "T1-L2-3");
    }

    #[test]
    fn test_rank_descending_is_stable() {
        let mut thoughts = vec![
            thought("A", 5.0),
            thought("B", 8.0),
            thought("C", 5.0),
            thought("D", 9.0),
        ];
        rank_descending(&mut thoughts);
        let ids: Vec<&str> = thoughts.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_thought_serializes_scores() {
        let json = serde_json::to_value(thought("T1", 4.0)).unwrap();
        assert_eq!(json["id"], "T1");
        assert_eq!(json["criteria_scores"]["ux"], 4.0);
        assert!(json["total_score"].as_f64().is_some());
    }
}
