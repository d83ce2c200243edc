//! Language-model contract.
//!
//! The runtime only needs two requests from a model: a plain completion and
//! a completion that may request tool calls. [`LlmClient`] is the default
//! implementation over an OpenAI-compatible chat-completions endpoint.

mod client;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::LlmClient;

use crate::error::LlmResult;
use crate::message::Message;
use crate::tool::ToolSchema;

/// How the model may use the offered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Tool calls are not allowed; only text is used.
    None,
    #[default]
    Auto,
    /// At least one tool call is expected.
    Required,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::None => "none",
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
        }
    }
}

impl fmt::Display for ToolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision-making dependency of an agent.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;

    /// Whether this binding can serve requests at all.
    fn conforms(&self) -> bool {
        !self.model_name().is_empty()
    }

    /// Plain completion; returns the assistant text.
    async fn ask(&self, messages: &[Message], system_msgs: &[Message]) -> LlmResult<String>;

    /// Completion that may request tool calls.
    ///
    /// Returns an assistant entry whose `tool_calls` carry the requests.
    async fn ask_tool(
        &self,
        messages: &[Message],
        system_msgs: &[Message],
        tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> LlmResult<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_choice_wire_names() {
        assert_eq!(serde_json::to_string(&ToolChoice::Required).unwrap(), "\"required\"");
        assert_eq!(ToolChoice::None.to_string(), "none");
        assert_eq!(ToolChoice::default(), ToolChoice::Auto);
    }
}
