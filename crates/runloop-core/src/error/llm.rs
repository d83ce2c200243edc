//! Language-model transport errors.

use thiserror::Error;

/// Errors reported by a `LanguageModel` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// The request never produced a response.
    #[error("LLM request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("LLM endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    /// The response carried no choices.
    #[error("LLM returned no choices")]
    EmptyResponse,

    /// The conversation no longer fits the model's context window.
    #[error("LLM token limit exceeded")]
    TokenLimit,
}

/// Result type alias for language-model calls.
pub type LlmResult<T> = Result<T, LlmError>;
