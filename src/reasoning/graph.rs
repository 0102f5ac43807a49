//! Graph-of-Thoughts: thoughts as nodes, classified relations as edges.
//!
//! Every unordered pair of thoughts gets two directed edges: the forward
//! relation `i -> j` and its inverse `j -> i` with the same strength.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::community::{ClusterAssignment, Partition};
use super::relation::{RelationClassifier, RelationKind, ThresholdClassifier};
use super::thought::Thought;

/// Characters of a summary shown in a node preview.
const SUMMARY_PREVIEW_CHARS: usize = 50;

/// Edge payload: one directed relation between two thoughts.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub from_id: String,
    pub to_id: String,
    pub kind: RelationKind,
    /// Set on the reverse edge of a pair.
    pub inverse: bool,
    pub strength: u8,
    /// Stronger thought of a `better_than` pair, on both edges.
    pub winner: Option<String>,
}

impl Relation {
    /// `kind`, or `inverse_<kind>` on reverse edges.
    pub fn label(&self) -> String {
        if self.inverse {
            self.kind.inverse_label()
        } else {
            self.kind.as_str().to_string()
        }
    }

    /// Edge weight used by clustering.
    pub fn weight(&self) -> f64 {
        f64::from(self.strength)
    }
}

/// Directed graph of thoughts and their pairwise relations.
#[derive(Debug, Clone, Default)]
pub struct ThoughtGraph {
    graph: DiGraph<Thought, Relation>,
    index: HashMap<String, NodeIndex>,
}

impl ThoughtGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Thoughts in insertion order.
    pub fn thoughts(&self) -> impl Iterator<Item = &Thought> + '_ {
        self.graph.node_weights()
    }

    pub fn thought(&self, id: &str) -> Option<&Thought> {
        self.index.get(id).map(|ix| &self.graph[*ix])
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// The relation on the directed edge `from -> to`, if any.
    pub fn relation(&self, from: &str, to: &str) -> Option<&Relation> {
        let (a, b) = (self.node_index(from)?, self.node_index(to)?);
        self.graph.find_edge(a, b).map(|e| &self.graph[e])
    }

    /// All relations in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.graph.edge_weights()
    }

    /// One `(i, j, weight)` per unordered pair with `i < j`, taken from the
    /// forward edges. Indices are insertion positions.
    pub fn undirected_edges(&self) -> Vec<(usize, usize, f64)> {
        self.graph
            .edge_references()
            .filter(|e| !e.weight().inverse)
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                (a.min(b), a.max(b), e.weight().weight())
            })
            .collect()
    }

    /// Underlying petgraph structure.
    pub fn inner(&self) -> &DiGraph<Thought, Relation> {
        &self.graph
    }

    /// Serializable snapshot of the graph with cluster labels.
    pub fn view(&self, partition: &Partition) -> GraphView {
        let nodes = self
            .thoughts()
            .map(|t| NodeView {
                id: t.id().to_string(),
                score: t.total_score(),
                summary: preview(t.summary()),
            })
            .collect();

        let edges = self
            .relations()
            .map(|r| EdgeView {
                source: r.from_id.clone(),
                target: r.to_id.clone(),
                relation: r.label(),
                weight: r.strength,
                winner: r.winner.clone(),
            })
            .collect();

        GraphView {
            nodes,
            edges,
            clusters: partition.assignments(self),
        }
    }

    fn add_thought(&mut self, thought: Thought) -> Option<NodeIndex> {
        if self.index.contains_key(thought.id()) {
            return None;
        }
        let id = thought.id().to_string();
        let ix = self.graph.add_node(thought);
        self.index.insert(id, ix);
        Some(ix)
    }
}

fn preview(summary: &str) -> String {
    let head: String = summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Builds a [`ThoughtGraph`] using a pluggable relation classifier.
#[derive(Clone)]
pub struct ThoughtGraphBuilder {
    classifier: Arc<dyn RelationClassifier>,
}

impl ThoughtGraphBuilder {
    pub fn new(classifier: Arc<dyn RelationClassifier>) -> Self {
        Self { classifier }
    }

    /// Add every thought as a node, then relate every unordered pair once.
    ///
    /// Thoughts whose id is already in the graph are skipped.
    pub fn build(&self, thoughts: &[Thought]) -> ThoughtGraph {
        let mut graph = ThoughtGraph::default();
        let mut nodes = Vec::with_capacity(thoughts.len());

        for thought in thoughts {
            match graph.add_thought(thought.clone()) {
                Some(ix) => nodes.push(ix),
                None => warn!(thought_id = %thought.id(), "Skipping duplicate thought id"),
            }
        }

        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                let (first, second) = (&graph.graph[a], &graph.graph[b]);
                let classification = self.classifier.classify(first, second);
                let forward = Relation {
                    from_id: first.id().to_string(),
                    to_id: second.id().to_string(),
                    kind: classification.kind,
                    inverse: false,
                    strength: classification.strength,
                    winner: classification.winner,
                };
                let backward = Relation {
                    from_id: forward.to_id.clone(),
                    to_id: forward.from_id.clone(),
                    inverse: true,
                    ..forward.clone()
                };

                debug!(
                    from = %forward.from_id,
                    to = %forward.to_id,
                    relation = %forward.kind,
                    strength = forward.strength,
                    "Classified thought pair"
                );
                graph.graph.add_edge(a, b, forward);
                graph.graph.add_edge(b, a, backward);
            }
        }

        graph
    }
}

impl Default for ThoughtGraphBuilder {
    fn default() -> Self {
        Self::new(Arc::new(ThresholdClassifier::default()))
    }
}

/// Serializable node of a [`GraphView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub score: f64,
    pub summary: String,
}

/// Serializable edge of a [`GraphView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub weight: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// Graph snapshot returned in the pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub clusters: Vec<ClusterAssignment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::relation::Classification;
    use crate::reasoning::scoring::{uniform_scores, ScoringEngine};
    use pretty_assertions::assert_eq;

    fn thought(id: &str, value: f64) -> Thought {
        let engine = ScoringEngine::default();
        let scores = engine.validate(&uniform_scores(value)).unwrap();
        Thought::new(id, format!("Approach {}", id), scores, &engine)
    }

    struct Fixed(RelationKind);

    impl RelationClassifier for Fixed {
        fn classify(&self, _a: &Thought, _b: &Thought) -> Classification {
            Classification::of(self.0)
        }
    }

    #[test]
    fn test_two_edges_per_pair() {
        let thoughts: Vec<Thought> = (1..=5).map(|i| thought(&format!("T{}", i), 6.0)).collect();
        let graph = ThoughtGraphBuilder::default().build(&thoughts);

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 5 * 4);
        assert_eq!(graph.undirected_edges().len(), 10);

        for a in &thoughts {
            assert!(graph.relation(a.id(), a.id()).is_none());
            for b in &thoughts {
                if a.id() == b.id() {
                    continue;
                }
                let there = graph.relation(a.id(), b.id()).unwrap();
                let back = graph.relation(b.id(), a.id()).unwrap();
                assert_eq!(there.strength, back.strength);
                assert_ne!(there.inverse, back.inverse);
                assert_eq!(there.kind, back.kind);
            }
        }
    }

    #[test]
    fn test_better_than_edges() {
        let graph = ThoughtGraphBuilder::default().build(&[thought("T1", 9.0), thought("T2", 5.0)]);

        let forward = graph.relation("T1", "T2").unwrap();
        assert_eq!(forward.label(), "better_than");
        assert_eq!(forward.strength, 3);
        assert_eq!(forward.winner.as_deref(), Some("T1"));

        let backward = graph.relation("T2", "T1").unwrap();
        assert_eq!(backward.label(), "inverse_better_than");
        assert_eq!(backward.strength, 3);
        assert_eq!(backward.winner.as_deref(), Some("T1"));
    }

    #[test]
    fn test_forward_edge_follows_input_order() {
        // T2 ranks higher but comes second: the edge still runs T1 -> T2.
        let graph = ThoughtGraphBuilder::default().build(&[thought("T1", 3.0), thought("T2", 9.0)]);
        let forward = graph.relation("T1", "T2").unwrap();
        assert!(!forward.inverse);
        assert_eq!(forward.winner.as_deref(), Some("T2"));
    }

    #[test]
    fn test_classifier_is_pluggable() {
        let builder = ThoughtGraphBuilder::new(Arc::new(Fixed(RelationKind::DependsOn)));
        let graph = builder.build(&[thought("A", 9.0), thought("B", 1.0)]);
        assert_eq!(graph.relation("A", "B").unwrap().label(), "depends_on");
        assert_eq!(graph.relation("B", "A").unwrap().label(), "inverse_depends_on");
        assert_eq!(graph.undirected_edges(), vec![(0, 1, 2.0)]);
    }

    #[test]
    fn test_duplicate_ids_are_skipped() {
        let graph = ThoughtGraphBuilder::default().build(&[
            thought("T1", 6.0),
            thought("T1", 9.0),
            thought("T2", 6.0),
        ]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!((graph.thought("T1").unwrap().total_score() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_and_empty_graphs() {
        let builder = ThoughtGraphBuilder::default();
        assert_eq!(builder.build(&[]).node_count(), 0);

        let single = builder.build(&[thought("T1", 6.0)]);
        assert_eq!(single.node_count(), 1);
        assert_eq!(single.edge_count(), 0);
    }

    #[test]
    fn test_view() {
        let graph = ThoughtGraphBuilder::default().build(&[thought("T1", 9.0), thought("T2", 5.0)]);
        let partition = Partition::single(graph.node_count());
        let view = graph.view(&partition);

        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.nodes[0].summary, "Approach T1...");
        assert_eq!(view.edges.len(), 2);
        assert_eq!(view.edges[1].relation, "inverse_better_than");
        assert_eq!(view.clusters[1].thought_id, "T2");
        assert_eq!(view.clusters[1].cluster_id, 0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["edges"][0]["winner"], "T1");
        assert_eq!(json["edges"][0]["weight"], 3);
    }

    #[test]
    fn test_preview_truncates_long_summaries() {
        let long = "x".repeat(80);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
    }
}
