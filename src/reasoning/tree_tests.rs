//! Unit tests for Tree-of-Thoughts generation and expansion.

use super::*;
use crate::error::LangbaseError;
use crate::generation::{MockGenerationContract, StubGenerator};
use crate::reasoning::scoring::uniform_scores;
use async_trait::async_trait;
use pretty_assertions::assert_eq;

fn stub_generator() -> ThoughtGenerator {
    ThoughtGenerator::new(
        Arc::new(StubGenerator::new()),
        ScoringEngine::default(),
        Duration::from_secs(5),
    )
}

fn mock_generator(records: Vec<CandidateRecord>) -> ThoughtGenerator {
    let mut mock = MockGenerationContract::new();
    mock.expect_generate()
        .times(1)
        .returning(move |_| Ok(records.clone()));
    ThoughtGenerator::new(Arc::new(mock), ScoringEngine::default(), Duration::from_secs(5))
}

fn record(id: &str, value: f64) -> CandidateRecord {
    CandidateRecord::new(id, format!("Title {}", id), "Description", uniform_scores(value))
}

fn ids(thoughts: &[Thought]) -> Vec<&str> {
    thoughts.iter().map(|t| t.id()).collect()
}

// ============================================================================
// generate_initial
// ============================================================================

#[tokio::test]
async fn test_generate_initial_ranks_stub_records() {
    let thoughts = stub_generator().generate_initial("X").await.unwrap();

    assert_eq!(ids(&thoughts), vec!["T1", "T4", "T3", "T2", "T5"]);
    assert!((thoughts[0].total_score() - 8.57).abs() < 1e-9);
    assert!((thoughts[4].total_score() - 5.16).abs() < 1e-9);
    assert!(thoughts[0]
        .summary()
        .starts_with("React Native + external Plant.id API\n\n"));
}

#[tokio::test]
async fn test_generate_initial_top_id_is_stable() {
    let generator = stub_generator();
    let first = generator.generate_initial("X").await.unwrap();
    let second = generator.generate_initial("X").await.unwrap();
    assert_eq!(first[0].id(), second[0].id());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_generate_initial_sends_canonical_schema() {
    let mut mock = MockGenerationContract::new();
    mock.expect_generate()
        .withf(|request| {
            request.task == "Plant app" && request.count == 5 && request.criteria == Criterion::schema()
        })
        .times(1)
        .returning(|_| Ok(vec![record("T1", 5.0)]));

    let generator =
        ThoughtGenerator::new(Arc::new(mock), ScoringEngine::default(), Duration::from_secs(1));
    assert_eq!(generator.generate_initial("Plant app").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_initial_drops_invalid_candidates() {
    let mut missing = record("T2", 7.0);
    missing.scores.remove("ux");
    let mut out_of_range = record("T3", 7.0);
    out_of_range.scores.insert("risk".to_string(), 11.0);

    let generator = mock_generator(vec![
        record("T1", 6.0),
        missing,
        out_of_range,
        record("T1", 9.0),
        record("T4", 8.0),
    ]);

    let thoughts = generator.generate_initial("X").await.unwrap();
    assert_eq!(ids(&thoughts), vec!["T4", "T1"]);
}

#[tokio::test]
async fn test_generate_initial_assigns_missing_ids() {
    let generator = mock_generator(vec![record("", 6.0), record("  ", 7.0)]);
    let thoughts = generator.generate_initial("X").await.unwrap();
    assert_eq!(ids(&thoughts), vec!["T2", "T1"]);
}

#[tokio::test]
async fn test_generate_initial_keeps_at_most_six() {
    let records = (1..=8).map(|i| record(&format!("T{}", i), i as f64)).collect();
    let thoughts = mock_generator(records).generate_initial("X").await.unwrap();
    assert_eq!(thoughts.len(), BEAM_WIDTH);
    assert_eq!(thoughts[0].id(), "T8");
}

#[tokio::test]
async fn test_generate_initial_all_invalid_is_empty_error() {
    let mut bad = record("T1", 5.0);
    bad.scores.insert("speed".to_string(), 5.0);

    let err = mock_generator(vec![bad]).generate_initial("X").await.unwrap_err();
    assert!(matches!(err, GenerationError::Empty { ref task } if task == "X"));
}

#[tokio::test]
async fn test_generate_initial_unparsable_response_is_empty_error() {
    // A backend that could not extract any payload reports an empty list.
    let err = mock_generator(vec![]).generate_initial("X").await.unwrap_err();
    assert!(matches!(err, GenerationError::Empty { .. }));
}

#[tokio::test]
async fn test_generate_initial_propagates_backend_error() {
    let mut mock = MockGenerationContract::new();
    mock.expect_generate().times(1).returning(|_| {
        Err(GenerationError::Backend(LangbaseError::Api {
            status: 500,
            message: "boom".to_string(),
        }))
    });

    let generator =
        ThoughtGenerator::new(Arc::new(mock), ScoringEngine::default(), Duration::from_secs(1));
    let err = generator.generate_initial("X").await.unwrap_err();
    assert!(matches!(err, GenerationError::Backend(_)));
}

struct HangingContract;

#[async_trait]
impl GenerationContract for HangingContract {
    async fn generate(&self, _request: &GenerationRequest) -> GenerationResult<Vec<CandidateRecord>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![])
    }
}

#[tokio::test]
async fn test_generate_initial_times_out() {
    let generator = ThoughtGenerator::new(
        Arc::new(HangingContract),
        ScoringEngine::default(),
        Duration::from_millis(20),
    );
    let err = generator.generate_initial("X").await.unwrap_err();
    assert!(matches!(err, GenerationError::Timeout { timeout_ms: 20 }));
}

// ============================================================================
// expand
// ============================================================================

#[tokio::test]
async fn test_expand_default_tree() {
    let generator = stub_generator();
    let initial = generator.generate_initial("X").await.unwrap();
    let expanded = generator.expand(&initial, DEFAULT_DEPTH, DEFAULT_BRANCHING_FACTOR);

    assert_eq!(
        ids(&expanded),
        vec![
            "T1-L2-3-L3-3",
            "T1-L2-3-L3-2",
            "T1-L2-2-L3-3",
            "T1",
            "T1-L2-2-L3-2",
            "T1-L2-1-L3-3",
        ]
    );
    assert!((expanded[0].total_score() - 9.47).abs() < 1e-9);
}

#[tokio::test]
async fn test_expand_is_sorted_and_bounded() {
    let generator = stub_generator();
    let initial = generator.generate_initial("X").await.unwrap();

    for depth in 1..=5 {
        let expanded = generator.expand(&initial, depth, DEFAULT_BRANCHING_FACTOR);
        assert!(expanded.len() <= BEAM_WIDTH);
        assert!(expanded
            .windows(2)
            .all(|w| w[0].total_score() >= w[1].total_score()));
    }
}

#[tokio::test]
async fn test_expand_depth_one_returns_initial_without_duplicates() {
    let generator = stub_generator();
    let initial = generator.generate_initial("X").await.unwrap();
    let expanded = generator.expand(&initial, 1, DEFAULT_BRANCHING_FACTOR);
    assert_eq!(expanded, initial);
}

#[tokio::test]
async fn test_expand_respects_branching_factor() {
    let generator = stub_generator();
    let initial = generator.generate_initial("X").await.unwrap();
    let expanded = generator.expand(&initial, 2, 1);

    assert_eq!(
        ids(&expanded),
        vec!["T1-L2-3", "T1", "T1-L2-2", "T1-L2-1", "T4", "T3"]
    );
}

#[tokio::test]
async fn test_expand_is_deterministic() {
    let generator = stub_generator();
    let initial = generator.generate_initial("X").await.unwrap();
    let a = generator.expand(&initial, 4, 3);
    let b = generator.expand(&initial, 4, 3);
    assert_eq!(a, b);
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.total_score().to_bits(), y.total_score().to_bits());
    }
}

#[test]
fn test_child_variants_shift_and_clamp() {
    let generator = stub_generator();
    let engine = ScoringEngine::default();
    let parent = Thought::new(
        "P",
        "parent",
        engine.validate(&uniform_scores(10.0)).unwrap(),
        &engine,
    );

    let children: Vec<Thought> = (1..=3).map(|i| generator.child_of(&parent, 2, i)).collect();
    assert_eq!(ids(&children), vec!["P-L2-1", "P-L2-2", "P-L2-3"]);
    assert!((children[0].total_score() - 9.5).abs() < 1e-9);
    assert!((children[1].total_score() - 10.0).abs() < 1e-9);
    assert!((children[2].total_score() - 10.0).abs() < 1e-9);
    assert!(children[0].summary().starts_with("Evolution of P: variant 1\n\nparent"));
}

#[test]
fn test_expand_empty_input() {
    assert!(stub_generator().expand(&[], 3, 4).is_empty());
}
