//! Error Types
//!
//! This module defines the error taxonomy of the runtime. Errors are split
//! by the boundary that produces them:
//! - `message`: invalid caller input when building conversation entries
//! - `memory`: invalid caller input against conversation memory
//! - `tool`: errors raised by tools and by typed tool lookup
//! - `agent`: lifecycle misuse and step failures
//! - `llm`: language-model transport failures
//! - `config`: configuration loading and validation
//! - `conversions`: the umbrella `RunloopError`
//!
//! Tool errors never escape a dispatch boundary; they are converted into
//! `ExecutionResult::Failure` values there. Everything else is returned to
//! the direct caller.

mod agent;
mod config;
mod conversions;
mod llm;
mod memory;
mod message;
mod tool;

pub use agent::{AgentError, AgentResult};
pub use config::{ConfigError, ConfigResult};
pub use conversions::{RunloopError, RunloopResult};
pub use llm::{LlmError, LlmResult};
pub use memory::{MemoryError, MemoryResult};
pub use message::MessageError;
pub use tool::ToolError;
