//! End-to-end brainstorming pipeline.
//!
//! Stages run strictly in order:
//! `init -> generating -> expanding -> graph_building -> clustering -> synthesizing -> done`.
//! Only generation can fail the run; clustering problems fall back to a
//! single cluster.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::community::{
    bridge_thoughts, detector_for, CommunityDetector, Partition, SingleClusterDetector,
    DEFAULT_BRIDGE_COUNT,
};
use super::graph::{GraphView, ThoughtGraphBuilder};
use super::hybrid::{select_best, HybridSynthesizer, HybridThought};
use super::relation::{RelationClassifier, ThresholdClassifier};
use super::scoring::{CriterionWeights, ScoringEngine};
use super::thought::Thought;
use super::tree::ThoughtGenerator;
use crate::config::PipelineConfig;
use crate::error::{ClusteringError, PipelineError};
use crate::generation::GenerationContract;

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    Generating,
    Expanding,
    GraphBuilding,
    Clustering,
    Synthesizing,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::Generating => "generating",
            PipelineStage::Expanding => "expanding",
            PipelineStage::GraphBuilding => "graph_building",
            PipelineStage::Clustering => "clustering",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub task: String,
    /// Top thoughts after expansion, best first.
    pub thoughts: Vec<Thought>,
    pub graph: GraphView,
    pub cluster_count: usize,
    pub hybrids: Vec<HybridThought>,
    pub best_hybrid: Option<HybridThought>,
    pub bridge_thoughts: Vec<String>,
    pub completed_at: DateTime<Utc>,
    pub latency_ms: i64,
}

/// Tree-of-Thoughts to Graph-of-Thoughts brainstorming pipeline.
#[derive(Clone)]
pub struct Pipeline {
    contract: Arc<dyn GenerationContract>,
    engine: ScoringEngine,
    classifier: Arc<dyn RelationClassifier>,
    detector: Arc<dyn CommunityDetector>,
    synthesizer: HybridSynthesizer,
    depth: usize,
    branching_factor: usize,
    generation_timeout: Duration,
}

impl Pipeline {
    /// Create a pipeline from configuration.
    ///
    /// An unknown clustering backend is logged and replaced by the
    /// single-cluster detector.
    pub fn new(contract: Arc<dyn GenerationContract>, config: &PipelineConfig) -> Self {
        let detector = detector_for(&config.clustering.backend, config.clustering.seed)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to single-cluster detection");
                Arc::new(SingleClusterDetector)
            });

        Self {
            contract,
            engine: ScoringEngine::default(),
            classifier: Arc::new(ThresholdClassifier::new(config.relation_score_gap)),
            detector,
            synthesizer: HybridSynthesizer::new(),
            depth: config.depth,
            branching_factor: config.branching_factor,
            generation_timeout: Duration::from_millis(config.generation_timeout_ms),
        }
    }

    /// Use a different relation classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn RelationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Use a different community detector
    pub fn with_detector(mut self, detector: Arc<dyn CommunityDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Score thoughts with an alternate rubric
    pub fn with_weights(mut self, weights: CriterionWeights) -> Self {
        self.engine = ScoringEngine::new(weights);
        self
    }

    /// Name of the active community detector.
    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Run every stage for `task`.
    pub async fn run(&self, task: &str) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        log_stage(&run_id, PipelineStage::Init);

        let task = task.trim();
        if task.is_empty() {
            return Err(PipelineError::InvalidInput {
                message: "Task cannot be empty".to_string(),
            });
        }

        log_stage(&run_id, PipelineStage::Generating);
        let generator =
            ThoughtGenerator::new(self.contract.clone(), self.engine, self.generation_timeout);
        let initial = generator.generate_initial(task).await.map_err(|source| {
            warn!(run_id = %run_id, error = %source, "Generation failed");
            PipelineError::Stage {
                stage: PipelineStage::Generating,
                source,
            }
        })?;

        log_stage(&run_id, PipelineStage::Expanding);
        let thoughts = generator.expand(&initial, self.depth, self.branching_factor);

        log_stage(&run_id, PipelineStage::GraphBuilding);
        let graph = ThoughtGraphBuilder::new(self.classifier.clone()).build(&thoughts);
        debug!(
            run_id = %run_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Thought graph built"
        );

        log_stage(&run_id, PipelineStage::Clustering);
        let partition = self
            .detector
            .partition(&graph)
            .and_then(|p| {
                if p.len() == graph.node_count() {
                    Ok(p)
                } else {
                    Err(ClusteringError::PartitionSize {
                        expected: graph.node_count(),
                        actual: p.len(),
                    })
                }
            })
            .unwrap_or_else(|e| {
                warn!(
                    run_id = %run_id,
                    detector = self.detector.name(),
                    error = %e,
                    "Community detection failed, using a single cluster"
                );
                Partition::single(graph.node_count())
            });
        let bridges = bridge_thoughts(&graph, DEFAULT_BRIDGE_COUNT);

        log_stage(&run_id, PipelineStage::Synthesizing);
        let hybrids = self.synthesizer.synthesize(&graph, &partition);
        let best_hybrid = select_best(&hybrids).cloned();

        log_stage(&run_id, PipelineStage::Done);
        let latency = start.elapsed().as_millis() as i64;
        info!(
            run_id = %run_id,
            thoughts = thoughts.len(),
            clusters = partition.cluster_count(),
            hybrids = hybrids.len(),
            best_hybrid = best_hybrid.as_ref().map(|h| h.id.as_str()).unwrap_or("none"),
            latency_ms = latency,
            "Brainstorming run complete"
        );

        Ok(PipelineResult {
            run_id,
            task: task.to_string(),
            graph: graph.view(&partition),
            cluster_count: partition.cluster_count(),
            thoughts,
            hybrids,
            best_hybrid,
            bridge_thoughts: bridges,
            completed_at: Utc::now(),
            latency_ms: latency,
        })
    }
}

fn log_stage(run_id: &str, stage: PipelineStage) {
    info!(run_id = %run_id, stage = %stage, "Entering pipeline stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::StubGenerator;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::GraphBuilding.to_string(), "graph_building");
        assert_eq!(
            serde_json::to_string(&PipelineStage::Synthesizing).unwrap(),
            "\"synthesizing\""
        );
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let mut config = PipelineConfig::default();
        config.clustering.backend = "leiden".to_string();
        let pipeline = Pipeline::new(Arc::new(StubGenerator::new()), &config);
        assert_eq!(pipeline.detector_name(), "single");
    }

    #[test]
    fn test_default_backend_is_louvain() {
        let pipeline = Pipeline::new(Arc::new(StubGenerator::new()), &PipelineConfig::default());
        assert_eq!(pipeline.detector_name(), "louvain");
    }

    #[tokio::test]
    async fn test_blank_task_is_rejected() {
        let pipeline = Pipeline::new(Arc::new(StubGenerator::new()), &PipelineConfig::default());
        let err = pipeline.run("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { .. }));
        assert_eq!(err.stage(), PipelineStage::Init);
    }

    #[test]
    fn test_pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
