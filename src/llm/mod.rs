//! External text-generation collaborators.
//!
//! The core only sees the [`TextClassifier`] and [`Summarizer`] contracts. Both
//! are best-effort: callers recover from every [`LlmError`] locally.
//! [`gemini::GeminiClient`] implements both over HTTP.

pub mod gemini;
pub mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::types::ContextEntry;

#[derive(Debug, Error)]
pub enum LlmError {
    /// No client configured (disabled, or missing API key).
    #[error("text-generation service unavailable: {0}")]
    Unavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no text")]
    EmptyResponse,

    /// The classifier answered with something that is not a known category.
    #[error("unexpected classification reply: {0}")]
    UnexpectedReply(String),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Maps free text to a category name.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, LlmError>;
}

/// Synthesizes an answer to `query` from one category's entries.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        category: &str,
        entries: &[ContextEntry],
        query: &str,
    ) -> Result<String, LlmError>;
}
