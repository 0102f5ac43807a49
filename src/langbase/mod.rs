//! Langbase Pipes client used as the live generation backend.

mod client;
mod types;

pub use client::LangbaseClient;
pub use types::*;
