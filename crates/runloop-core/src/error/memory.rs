//! Conversation memory errors.
//!
//! Memory itself cannot fail to store an entry; these errors only report
//! invalid requests made against it.

use thiserror::Error;

use super::message::MessageError;

/// Errors that can occur when reading from or writing to conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// A window of recent entries was requested with a non-positive size.
    #[error("Number of recent messages must be positive, got {requested}")]
    InvalidCount { requested: usize },

    /// An entry could not be built from the supplied role and content.
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Result type alias for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
