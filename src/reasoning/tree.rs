//! Tree-of-Thoughts: initial generation and level-by-level expansion.
//!
//! Expansion is a deterministic "evolution" of the best candidates: every
//! parent yields three children whose scores are shifted by -0.5, 0 and +0.5.
//! No generation call is made past the first level.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::scoring::{Criterion, ScoringEngine};
use super::thought::{rank_descending, Thought};
use crate::error::{GenerationError, GenerationResult, SchemaError};
use crate::generation::{CandidateRecord, GenerationContract, GenerationRequest};

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tree_tests;

/// Thoughts kept after generation and after every expansion level.
pub const BEAM_WIDTH: usize = 6;

/// Children produced per expanded parent.
pub const CHILDREN_PER_PARENT: usize = 3;

/// Score shift between neighbouring child variants.
pub const VARIANT_STEP: f64 = 0.5;

/// Default number of tree levels, counting the initial generation.
pub const DEFAULT_DEPTH: usize = 3;

/// Default number of parents expanded per level.
pub const DEFAULT_BRANCHING_FACTOR: usize = 4;

/// Produces and expands scored candidate thoughts.
#[derive(Clone)]
pub struct ThoughtGenerator {
    contract: Arc<dyn GenerationContract>,
    engine: ScoringEngine,
    timeout: Duration,
}

impl ThoughtGenerator {
    /// Create a generator over a generation contract
    pub fn new(contract: Arc<dyn GenerationContract>, engine: ScoringEngine, timeout: Duration) -> Self {
        Self {
            contract,
            engine,
            timeout,
        }
    }

    /// Request candidates for `task` and turn the valid ones into ranked thoughts.
    ///
    /// Invalid candidates are dropped with a warning. Fails when the contract
    /// errors, exceeds the timeout, or leaves no valid candidate.
    pub async fn generate_initial(&self, task: &str) -> GenerationResult<Vec<Thought>> {
        let request = GenerationRequest::new(task, Criterion::schema());

        let records = tokio::time::timeout(self.timeout, self.contract.generate(&request))
            .await
            .map_err(|_| GenerationError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        debug!(received = records.len(), "Generation contract returned candidates");

        let mut thoughts = self.validate_records(records);
        if thoughts.is_empty() {
            return Err(GenerationError::Empty {
                task: task.to_string(),
            });
        }

        rank_descending(&mut thoughts);
        thoughts.truncate(BEAM_WIDTH);

        info!(
            count = thoughts.len(),
            best_id = %thoughts[0].id(),
            best_score = thoughts[0].total_score(),
            "Initial thoughts generated"
        );
        Ok(thoughts)
    }

    fn validate_records(&self, records: Vec<CandidateRecord>) -> Vec<Thought> {
        let mut seen = HashSet::new();
        let mut thoughts = Vec::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let id = if record.id.trim().is_empty() {
                format!("T{}", position + 1)
            } else {
                record.id.trim().to_string()
            };

            let validated = if seen.contains(&id) {
                Err(SchemaError::DuplicateId { id: id.clone() })
            } else {
                self.engine.validate(&record.scores)
            };

            match validated {
                Ok(scores) => {
                    seen.insert(id.clone());
                    let summary = format!("{}\n\n{}", record.title, record.description);
                    thoughts.push(Thought::new(id, summary, scores, &self.engine));
                }
                Err(e) => {
                    warn!(thought_id = %id, error = %e, "Dropping invalid candidate thought");
                }
            }
        }

        thoughts
    }

    /// Expand `thoughts` into a tree of deterministic variants.
    ///
    /// Levels `2..=depth` are expansion rounds. Each round expands the best
    /// `branching_factor` thoughts of the previous level and keeps the best
    /// [`BEAM_WIDTH`] children. The result is the best [`BEAM_WIDTH`] of the
    /// input thoughts plus the last surviving level.
    pub fn expand(&self, thoughts: &[Thought], depth: usize, branching_factor: usize) -> Vec<Thought> {
        let mut initial = thoughts.to_vec();
        rank_descending(&mut initial);

        let mut current = initial.clone();
        let mut expanded = false;

        for level in 2..=depth {
            let mut next_level = Vec::with_capacity(branching_factor * CHILDREN_PER_PARENT);
            for parent in current.iter().take(branching_factor) {
                for variant in 1..=CHILDREN_PER_PARENT {
                    next_level.push(self.child_of(parent, level, variant));
                }
            }

            rank_descending(&mut next_level);
            next_level.truncate(BEAM_WIDTH);
            debug!(
                level,
                survivors = next_level.len(),
                best_score = next_level.first().map(|t| t.total_score()),
                "Expanded tree level"
            );

            current = next_level;
            expanded = true;
        }

        let mut all = initial;
        if expanded {
            all.extend(current);
        }
        rank_descending(&mut all);
        all.truncate(BEAM_WIDTH);
        all
    }

    fn child_of(&self, parent: &Thought, level: usize, variant: usize) -> Thought {
        let delta = (variant as f64 - 2.0) * VARIANT_STEP;
        parent.variant(
            format!("{}-L{}-{}", parent.id(), level, variant),
            format!(
                "Evolution of {}: variant {}\n\n{}",
                parent.id(),
                variant,
                parent.summary()
            ),
            delta,
            &self.engine,
        )
    }
}
