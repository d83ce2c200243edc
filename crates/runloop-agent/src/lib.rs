//! # Runloop Agent
//!
//! Concrete agents for the Runloop runtime. [`ToolCallAgent`] implements
//! the step as a think/act cycle: ask the model which tools to call, run
//! them through a [`ToolCollection`](runloop_tools::ToolCollection), and
//! record the observations.

pub mod cleanup;
pub mod toolcall;

pub use cleanup::ToolCleanup;
pub use toolcall::ToolCallAgent;
