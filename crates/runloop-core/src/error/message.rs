//! Conversation entry errors.

use thiserror::Error;

/// Errors raised while building conversation entries from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The role name is not one of `system`, `user`, `assistant`, `tool`.
    #[error("Unsupported message role: {0}")]
    UnsupportedRole(String),
}
