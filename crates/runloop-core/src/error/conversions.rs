//! Umbrella error type covering every runtime domain.

use thiserror::Error;

use super::{AgentError, ConfigError, LlmError, MemoryError, MessageError, ToolError};

/// Top-level error for applications embedding the runtime.
#[derive(Debug, Error)]
pub enum RunloopError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for top-level operations.
pub type RunloopResult<T> = Result<T, RunloopError>;
