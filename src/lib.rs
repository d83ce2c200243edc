//! # Runloop
//!
//! A bounded agent execution runtime: a state machine that drives a
//! pluggable decision hook for a limited number of steps, keeps a
//! capacity-bounded conversation, notices when the agent repeats itself,
//! and dispatches named tools behind a boundary that turns tool errors into
//! data.
//!
//! This crate re-exports the workspace members:
//! - [`runloop_core`]: conversation, memory, tool contract, agent lifecycle
//! - [`runloop_tools`]: tool dispatch and built-in tools
//! - [`runloop_agent`]: the tool-calling agent

pub use runloop_agent::{ToolCallAgent, ToolCleanup};
pub use runloop_core::{
    Agent, AgentCore, AgentError, AgentResult, AgentState, Cleanup, ConversationMemory,
    ExecutionResult, LanguageModel, LlmClient, Message, NamedTool, NoopCleanup, Role,
    RunloopConfig, RunloopError, RunloopResult, StallDetector, Tool, ToolArgs, ToolCall,
    ToolChoice, ToolError, ToolResult, ToolSchema, logging, state_context,
};
pub use runloop_tools::{Terminate, ToolCollection};

pub use runloop_agent;
pub use runloop_core;
pub use runloop_tools;
