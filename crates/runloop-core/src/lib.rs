//! # Runloop Core
//!
//! Core types of the Runloop agent runtime: conversation entries and
//! memory, stall detection, the tool contract, the agent lifecycle and its
//! bounded run loop, the language-model contract, configuration and the
//! error taxonomy.
//!
//! Concrete tools and dispatch live in `runloop-tools`; concrete decision
//! hooks live in `runloop-agent`.

pub mod agent;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod message;
pub mod stall;
pub mod tool;

pub use agent::{Agent, AgentCore, AgentState, state_context};
pub use cleanup::{Cleanup, NoopCleanup};
pub use config::{AgentSettings, LlmSettings, LogConfig, LogFormat, RunloopConfig};
pub use error::{
    AgentError, AgentResult, ConfigError, ConfigResult, LlmError, LlmResult, MemoryError,
    MemoryResult, MessageError, RunloopError, RunloopResult, ToolError,
};
pub use llm::{LanguageModel, LlmClient, ToolChoice};
pub use memory::ConversationMemory;
pub use message::{FunctionCall, Message, Role, ToolCall};
pub use stall::{STALL_NOTICE, StallDetector};
pub use tool::{
    ExecutionResult, NamedTool, ResultKind, Tool, ToolArgs, ToolResult, ToolResultPatch,
    ToolSchema,
};
