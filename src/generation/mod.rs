//! Generation contract: the boundary that supplies raw candidate thoughts.
//!
//! - [`GenerationContract`]: the capability the pipeline consumes
//! - [`StubGenerator`]: fixed deterministic records for tests and offline runs
//! - [`LangbaseGenerator`]: candidates produced by a Langbase pipe
//!
//! Responses are parsed leniently with [`parse_candidates`]: a completion
//! that is not plain JSON is searched for an embedded payload before giving up.

mod langbase;
mod stub;

pub use langbase::LangbaseGenerator;
pub use stub::StubGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{GenerationError, GenerationResult};

/// Number of candidates requested per generation call.
pub const CANDIDATES_PER_REQUEST: usize = 5;

/// What the pipeline asks a generation backend for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Problem statement.
    pub task: String,
    /// Criterion names every candidate must be scored on, in order.
    pub criteria: Vec<String>,
    /// Number of candidates to produce.
    pub count: usize,
}

impl GenerationRequest {
    /// Create a request for the default number of candidates
    pub fn new(task: impl Into<String>, criteria: Vec<String>) -> Self {
        Self {
            task: task.into(),
            criteria,
            count: CANDIDATES_PER_REQUEST,
        }
    }
}

/// One raw candidate as returned by a backend, before schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "summary")]
    pub description: String,
    #[serde(default)]
    pub scores: HashMap<String, f64>,
}

impl CandidateRecord {
    /// Create a record with the given scores
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        scores: HashMap<String, f64>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            scores,
        }
    }
}

/// Source of candidate thoughts for a task.
///
/// Implementations may block on I/O; the caller bounds every call with a timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationContract: Send + Sync {
    /// Produce up to `request.count` candidate records for `request.task`.
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<CandidateRecord>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidatePayload {
    Envelope {
        #[serde(default)]
        thoughts: Vec<serde_json::Value>,
    },
    List(Vec<serde_json::Value>),
}

impl CandidatePayload {
    /// Convert each entry independently; malformed entries are logged and skipped.
    fn into_records(self) -> Vec<CandidateRecord> {
        let values = match self {
            CandidatePayload::Envelope { thoughts } => thoughts,
            CandidatePayload::List(values) => values,
        };

        values
            .into_iter()
            .enumerate()
            .filter_map(
                |(position, value)| match serde_json::from_value::<CandidateRecord>(value) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(
                            position = position,
                            error = %e,
                            "Skipping malformed candidate record"
                        );
                        None
                    }
                },
            )
            .collect()
    }
}

/// Parse a completion into candidate records.
///
/// Tries, in order: the whole completion, a ```json fenced block, any fenced
/// block, and the outermost `{ ... }` span. The first one that parses wins.
pub fn parse_candidates(completion: &str) -> GenerationResult<Vec<CandidateRecord>> {
    let mut last_error = None;
    for candidate in json_candidates(completion) {
        match serde_json::from_str::<CandidatePayload>(candidate) {
            Ok(payload) => return Ok(payload.into_records()),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(GenerationError::Parse {
        message: match last_error {
            Some(e) => format!(
                "{} (first 100 chars: '{}')",
                e,
                completion.chars().take(100).collect::<String>()
            ),
            None => "empty completion".to_string(),
        },
    })
}

/// Possible JSON payloads embedded in a completion, most specific first.
fn json_candidates(completion: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let trimmed = completion.trim();
    if !trimmed.is_empty() {
        found.push(trimmed);
    }

    if let Some(block) = completion
        .split("```json")
        .nth(1)
        .and_then(|s| s.split("```").next())
    {
        found.push(block.trim());
    }

    if let Some(block) = completion.split("```").nth(1) {
        found.push(block.trim());
    }

    if let (Some(start), Some(end)) = (completion.find('{'), completion.rfind('}')) {
        if start < end {
            found.push(&completion[start..=end]);
        }
    }

    found.retain(|s| !s.is_empty());
    found.dedup();
    found
}
