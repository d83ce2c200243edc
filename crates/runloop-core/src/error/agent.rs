//! Agent lifecycle and step errors.

use std::convert::Infallible;

use thiserror::Error;

use super::{ConfigError, LlmError, MemoryError};
use crate::agent::AgentState;

/// Errors that can occur while driving an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// `run` was called while the agent was not idle.
    #[error("Cannot run agent from state: {state}")]
    IllegalState { state: AgentState },

    /// A scoped transition targeted something that is not an agent state.
    #[error("Invalid state: {value}")]
    InvalidState { value: String },

    /// The decision hook failed.
    #[error("Agent step failed: {reason}")]
    Step { reason: String },

    /// The language model could not produce a response.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Conversation memory rejected a request.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The agent was built from invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AgentError {
    /// Create a step failure from any reason.
    pub fn step(reason: impl Into<String>) -> Self {
        AgentError::Step {
            reason: reason.into(),
        }
    }

    /// Whether the error reports misuse of the agent lifecycle.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            AgentError::IllegalState { .. } | AgentError::InvalidState { .. }
        )
    }
}

// Lets `state_context` accept an `AgentState` directly alongside raw names.
impl From<Infallible> for AgentError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
