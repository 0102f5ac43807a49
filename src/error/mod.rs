use thiserror::Error;

use crate::reasoning::PipelineStage;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Langbase error: {0}")]
    Langbase(#[from] LangbaseError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Langbase API errors
#[derive(Debug, Error)]
pub enum LangbaseError {
    #[error("Langbase unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A candidate thought or rubric that does not match the canonical criteria schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error(
        "Criteria mismatch: missing [{}], extra [{}]",
        .missing.join(", "),
        .extra.join(", ")
    )]
    CriteriaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Score for {criterion} is out of range [1,10]: {value}")]
    OutOfRange { criterion: String, value: f64 },

    #[error("Invalid criterion weights: {message}")]
    InvalidWeights { message: String },

    #[error("Duplicate thought id: {id}")]
    DuplicateId { id: String },
}

/// Errors raised while obtaining candidate thoughts from a generation contract
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No valid thoughts generated for task: {task}")]
    Empty { task: String },

    #[error("Unparsable generation response: {message}")]
    Parse { message: String },

    #[error("Generation backend failed: {0}")]
    Backend(LangbaseError),
}

impl From<LangbaseError> for GenerationError {
    fn from(err: LangbaseError) -> Self {
        match err {
            LangbaseError::Timeout { timeout_ms } => GenerationError::Timeout { timeout_ms },
            other => GenerationError::Backend(other),
        }
    }
}

/// Community detection errors. Always recovered by the single-cluster fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusteringError {
    #[error("Community detection backend unavailable: {backend}")]
    Unavailable { backend: String },

    #[error("Invalid edge weight {weight} between {from} and {to}")]
    InvalidWeight {
        from: String,
        to: String,
        weight: f64,
    },

    #[error("Partition covers {actual} thoughts, graph has {expected}")]
    PartitionSize { expected: usize, actual: usize },
}

/// Fatal pipeline errors surfaced to callers
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Pipeline failed during {stage}: {source}")]
    Stage {
        stage: PipelineStage,
        source: GenerationError,
    },
}

impl PipelineError {
    /// The stage that was running when the pipeline aborted.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::InvalidInput { .. } => PipelineStage::Init,
            PipelineError::Stage { stage, .. } => *stage,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for Langbase operations
pub type LangbaseResult<T> = Result<T, LangbaseError>;

/// Result type alias for generation contract calls
pub type GenerationResult<T> = Result<T, GenerationError>;
