//! # Brainstorm Reasoning
//!
//! A Tree-of-Thoughts to Graph-of-Thoughts brainstorming engine. Candidate
//! solutions to a task are generated, scored against a fixed ten-criterion
//! rubric, expanded into a tree of variants, related pairwise in a graph,
//! clustered, and synthesized into hybrid solutions.
//!
//! ## Architecture
//!
//! ```text
//! task → ThoughtGenerator ─(GenerationContract: stub | Langbase pipe)
//!          ↓ expand
//!        ThoughtGraphBuilder (RelationClassifier)
//!          ↓
//!        CommunityDetector (Louvain) + bridge thoughts
//!          ↓
//!        HybridSynthesizer → PipelineResult
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use brainstorm_reasoning::{Config, Pipeline, StubGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::new(Arc::new(StubGenerator::new()), &config.pipeline);
//!     let result = pipeline.run("Build a plant identification app").await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the environment.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Generation backends that supply candidate thoughts.
pub mod generation;
/// Langbase API client and types for pipe communication.
pub mod langbase;
/// System and task prompts for the generation pipe.
pub mod prompts;
/// Scoring, tree expansion, graph building, clustering and synthesis.
pub mod reasoning;

pub use config::Config;
pub use error::{AppError, AppResult, PipelineError};
pub use generation::{GenerationContract, LangbaseGenerator, StubGenerator};
pub use reasoning::{Pipeline, PipelineResult, PipelineStage};
