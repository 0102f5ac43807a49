//! Hybrid synthesis: one combined thought per multi-member cluster.

use serde::Serialize;
use tracing::debug;

use super::community::Partition;
use super::graph::ThoughtGraph;
use super::scoring::MAX_SCORE;

/// Multiplier applied to a cluster's mean score.
pub const SYNERGY_BONUS: f64 = 1.15;

/// Member summaries quoted in a hybrid summary.
const SUMMARIES_PER_HYBRID: usize = 2;

/// A synthesized combination of the thoughts in one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridThought {
    pub id: String,
    pub cluster_id: usize,
    /// Member thought ids in graph insertion order.
    pub components: Vec<String>,
    pub score: f64,
    pub summary: String,
}

/// Builds hybrid thoughts from a partitioned graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridSynthesizer;

impl HybridSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// One hybrid per cluster with at least two members, by ascending cluster id.
    pub fn synthesize(&self, graph: &ThoughtGraph, partition: &Partition) -> Vec<HybridThought> {
        let thoughts: Vec<_> = graph.thoughts().collect();

        partition
            .clusters()
            .into_iter()
            .enumerate()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(cluster_id, members)| {
                let members: Vec<_> = members.iter().map(|&ix| thoughts[ix]).collect();
                let average =
                    members.iter().map(|t| t.total_score()).sum::<f64>() / members.len() as f64;
                let components: Vec<String> = members.iter().map(|t| t.id().to_string()).collect();
                let quoted: Vec<&str> = members
                    .iter()
                    .take(SUMMARIES_PER_HYBRID)
                    .map(|t| t.summary())
                    .collect();

                let hybrid = HybridThought {
                    id: format!("HYBRID_C{}", cluster_id),
                    cluster_id,
                    score: (average * SYNERGY_BONUS).min(MAX_SCORE),
                    summary: format!(
                        "Hybrid of thoughts: {}\n\nCombines the approaches:\n{}",
                        components.join(", "),
                        quoted.join("\n\n")
                    ),
                    components,
                };
                debug!(
                    hybrid_id = %hybrid.id,
                    members = hybrid.components.len(),
                    score = hybrid.score,
                    "Synthesized hybrid"
                );
                hybrid
            })
            .collect()
    }
}

/// The highest-scoring hybrid; the first one wins a tie.
pub fn select_best(hybrids: &[HybridThought]) -> Option<&HybridThought> {
    hybrids.iter().fold(None, |best: Option<&HybridThought>, h| match best {
        Some(b) if b.score >= h.score => Some(b),
        _ => Some(h),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::graph::ThoughtGraphBuilder;
    use crate::reasoning::scoring::{uniform_scores, ScoringEngine};
    use crate::reasoning::thought::Thought;
    use pretty_assertions::assert_eq;

    fn graph(values: &[(&str, f64)]) -> ThoughtGraph {
        let engine = ScoringEngine::default();
        let thoughts: Vec<Thought> = values
            .iter()
            .map(|(id, v)| {
                let scores = engine.validate(&uniform_scores(*v)).unwrap();
                Thought::new(*id, format!("Summary {}", id), scores, &engine)
            })
            .collect();
        ThoughtGraphBuilder::default().build(&thoughts)
    }

    fn hybrid(id: &str, score: f64) -> HybridThought {
        HybridThought {
            id: id.to_string(),
            cluster_id: 0,
            components: vec![],
            score,
            summary: String::new(),
        }
    }

    #[test]
    fn test_hybrid_per_multi_member_cluster() {
        let g = graph(&[("T1", 6.0), ("T2", 4.0), ("T3", 5.0), ("T4", 7.0)]);
        let partition = Partition::from_labels(&[0, 1, 0, 2]);
        let hybrids = HybridSynthesizer::new().synthesize(&g, &partition);

        assert_eq!(hybrids.len(), 1);
        assert_eq!(hybrids[0].id, "HYBRID_C0");
        assert_eq!(hybrids[0].components, vec!["T1", "T3"]);
        assert!((hybrids[0].score - 5.5 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_hybrid_summary() {
        let g = graph(&[("T1", 6.0), ("T2", 6.0), ("T3", 6.0)]);
        let hybrids = HybridSynthesizer::new().synthesize(&g, &Partition::single(3));

        assert_eq!(
            hybrids[0].summary,
            "Hybrid of thoughts: T1, T2, T3\n\nCombines the approaches:\nSummary T1\n\nSummary T2"
        );
    }

    #[test]
    fn test_hybrid_score_is_capped() {
        let g = graph(&[("T1", 9.5), ("T2", 9.0)]);
        let hybrids = HybridSynthesizer::new().synthesize(&g, &Partition::single(2));
        assert_eq!(hybrids[0].score, 10.0);
    }

    #[test]
    fn test_singletons_produce_nothing() {
        let g = graph(&[("T1", 6.0), ("T2", 7.0)]);
        assert!(HybridSynthesizer::new()
            .synthesize(&g, &Partition::singletons(2))
            .is_empty());
    }

    #[test]
    fn test_select_best() {
        assert_eq!(select_best(&[]), None);

        let hybrids = vec![hybrid("A", 7.0), hybrid("B", 9.0), hybrid("C", 9.0)];
        assert_eq!(select_best(&hybrids).unwrap().id, "B");
    }
}
