//! Brainstorming core: Tree-of-Thoughts generation feeding a Graph-of-Thoughts.
//!
//! - [`scoring`]: criteria, weights and the weighted total score
//! - [`thought`]: the immutable scored candidate
//! - [`tree`]: initial generation and deterministic expansion
//! - [`relation`]: pairwise relation classification
//! - [`graph`]: the directed thought graph
//! - [`community`]: Louvain clustering and bridge detection
//! - [`hybrid`]: one synthesized thought per cluster
//! - [`pipeline`]: the staged orchestrator tying it together

pub mod community;
pub mod graph;
pub mod hybrid;
pub mod pipeline;
pub mod relation;
pub mod scoring;
pub mod thought;
pub mod tree;

pub use community::{
    bridge_thoughts, detector_for, modularity, ClusterAssignment, CommunityDetector,
    LouvainDetector, Partition, SingleClusterDetector,
};
pub use graph::{GraphView, Relation, ThoughtGraph, ThoughtGraphBuilder};
pub use hybrid::{select_best, HybridSynthesizer, HybridThought};
pub use pipeline::{Pipeline, PipelineResult, PipelineStage};
pub use relation::{
    Classification, KeywordClassifier, KeywordRule, RelationClassifier, RelationKind,
    ThresholdClassifier,
};
pub use scoring::{CriteriaScores, Criterion, CriterionWeights, ScoringEngine};
pub use thought::Thought;
pub use tree::ThoughtGenerator;
