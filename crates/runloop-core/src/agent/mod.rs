//! Agent lifecycle: state, scoped transitions, and the bounded run loop.

mod core;
mod state;

pub use self::core::{Agent, AgentCore, DEFAULT_MAX_STEPS, run_agent};
pub use self::state::{AgentState, LifecycleCell, state_context};
