use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use super::{CandidateRecord, GenerationContract, GenerationRequest};
use crate::error::GenerationResult;
use crate::reasoning::Criterion;

/// Deterministic generation backend returning a fixed set of records.
///
/// The default set describes five approaches to a plant identification app and
/// is identical on every call, whatever the task.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    records: Vec<CandidateRecord>,
}

impl StubGenerator {
    /// Stub with the built-in five records.
    pub fn new() -> Self {
        Self {
            records: default_records(),
        }
    }

    /// Stub returning the given records verbatim.
    pub fn with_records(records: Vec<CandidateRecord>) -> Self {
        Self { records }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationContract for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Vec<CandidateRecord>> {
        debug!(task = %request.task, count = request.count, "Serving stub candidates");
        Ok(self.records.iter().take(request.count).cloned().collect())
    }
}

/// Build a score map from values listed in canonical criterion order.
pub(crate) fn scores_in_order(values: [f64; 10]) -> HashMap<String, f64> {
    Criterion::ALL
        .iter()
        .zip(values)
        .map(|(c, v)| (c.as_str().to_string(), v))
        .collect()
}

fn default_records() -> Vec<CandidateRecord> {
    vec![
        CandidateRecord::new(
            "T1",
            "React Native + external Plant.id API",
            "Mobile app built with React Native that uses the external Plant.id API for \
             identification, with an offline-first approach for returning users.",
            scores_in_order([9.0, 9.0, 8.0, 9.0, 8.0, 10.0, 6.0, 9.0, 9.0, 8.0]),
        ),
        CandidateRecord::new(
            "T2",
            "Standalone on-device ML model",
            "Fully self-contained app with a locally running ML model for plant \
             identification; no internet connection required.",
            scores_in_order([10.0, 4.0, 3.0, 6.0, 4.0, 9.0, 5.0, 8.0, 5.0, 9.0]),
        ),
        CandidateRecord::new(
            "T3",
            "PWA with TensorFlow.js",
            "Progressive web app running TensorFlow.js for identification directly in \
             the browser, working on every device.",
            scores_in_order([8.0, 7.0, 7.0, 8.0, 6.0, 7.0, 4.0, 7.0, 8.0, 7.0]),
        ),
        CandidateRecord::new(
            "T4",
            "WhatsApp/Telegram Bot",
            "Chat-based approach: users send photos via WhatsApp or Telegram and receive \
             care tips as a reply.",
            scores_in_order([7.0, 8.0, 9.0, 7.0, 7.0, 8.0, 7.0, 6.0, 7.0, 9.0]),
        ),
        CandidateRecord::new(
            "T5",
            "AR glasses integration",
            "Augmented reality solution for professional nurseries with recognition \
             directly through AR glasses.",
            scores_in_order([6.0, 3.0, 2.0, 4.0, 9.0, 4.0, 10.0, 5.0, 3.0, 7.0]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::ScoringEngine;

    #[tokio::test]
    async fn test_stub_returns_five_valid_records() {
        let stub = StubGenerator::new();
        let request = GenerationRequest::new("X", Criterion::schema());
        let records = stub.generate(&request).await.unwrap();

        assert_eq!(records.len(), 5);
        let engine = ScoringEngine::default();
        for record in &records {
            assert!(engine.validate(&record.scores).is_ok(), "{}", record.id);
        }
    }

    #[tokio::test]
    async fn test_stub_is_deterministic() {
        let stub = StubGenerator::new();
        let request = GenerationRequest::new("X", Criterion::schema());
        let first = stub.generate(&request).await.unwrap();
        let second = stub.generate(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stub_respects_count() {
        let stub = StubGenerator::new();
        let mut request = GenerationRequest::new("X", Criterion::schema());
        request.count = 2;
        assert_eq!(stub.generate(&request).await.unwrap().len(), 2);
    }
}
