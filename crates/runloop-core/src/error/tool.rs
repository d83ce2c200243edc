//! Tool execution and lookup errors.
//!
//! `ToolError` is what a tool raises from `execute`. The dispatcher catches
//! it and turns it into an `ExecutionResult::Failure` carrying `message()`,
//! so callers of `dispatch` never see it as an `Err`. The lookup variants
//! are only produced by typed lookup, which is trusted wiring.

use thiserror::Error;

/// Errors raised by tools or by typed tool lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The tool ran but could not complete the requested operation.
    #[error("{message}")]
    Execution { message: String },

    /// The tool arguments could not be decoded.
    #[error("Error parsing arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// No tool with this name is registered.
    #[error("Tool {name} is not defined")]
    NotRegistered { name: String },

    /// A tool is registered under this name but has a different type.
    #[error("Tool {name} is not an instance of {expected}")]
    CapabilityMismatch { name: String, expected: String },

    /// Both operands of a result combination carry an image.
    #[error("Cannot combine tool results: both carry a base64 image")]
    AmbiguousImage,
}

impl ToolError {
    /// Create an execution error from any message.
    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution {
            message: message.into(),
        }
    }

    /// Create an argument decoding error for the named tool.
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// The text carried into a failure result.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
