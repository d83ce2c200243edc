//! # Runloop Testing
//!
//! Fixtures for exercising agents and tools without a network: tools with
//! canned responses, a scripted language model, a cleanup handle that
//! counts its calls, and an agent whose steps follow a script.

pub mod mock_agent;
pub mod mock_model;
pub mod mock_tools;

pub use mock_agent::{CountingCleanup, ScriptedAgent};
pub use mock_model::ScriptedModel;
pub use mock_tools::{MockTool, mock_collection};
