//! # Runloop Tools
//!
//! Tool dispatch for the Runloop agent runtime: [`ToolCollection`] keeps
//! tools in registration order, dispatches them by name, and turns every
//! tool failure into an [`ExecutionResult::Failure`](runloop_core::ExecutionResult).
//! Built-in tools live alongside it.

pub mod collection;
pub mod terminate;

pub use collection::ToolCollection;
pub use terminate::{Terminate, TerminateStatus};
