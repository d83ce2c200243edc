//! Built-in tool that ends an interaction.

use async_trait::async_trait;
use runloop_core::{NamedTool, Tool, ToolArgs, ToolError, ToolResult};
use serde::Deserialize;
use serde_json::{Value, json};

const DESCRIPTION: &str = "Terminate the interaction when the request is met or when the assistant cannot proceed further with the task.\nWhen you have finished all the tasks, call this tool to end the work.";

/// Finish status reported to `terminate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminateStatus {
    Success,
    Failure,
}

impl TerminateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminateStatus::Success => "success",
            TerminateStatus::Failure => "failure",
        }
    }
}

#[derive(Deserialize)]
struct TerminateArgs {
    status: TerminateStatus,
}

/// Signals that the agent is done; agents treat a call to it as the end of
/// the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminate;

impl NamedTool for Terminate {
    const NAME: &'static str = "terminate";
}

#[async_trait]
impl Tool for Terminate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "The finish status of the interaction.",
                    "enum": ["success", "failure"],
                }
            },
            "required": ["status"],
        }))
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let TerminateArgs { status } = serde_json::from_value(Value::Object(args))
            .map_err(|e| ToolError::invalid_arguments(Self::NAME, e.to_string()))?;
        Ok(ToolResult::output(format!(
            "The interaction has been completed with status: {}",
            status.as_str()
        )))
    }
}
