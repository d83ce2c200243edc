//! Think/act agent over a language model and a tool collection.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use runloop_core::{
    Agent, AgentCore, AgentError, AgentResult, AgentState, ExecutionResult, LlmError, Message,
    NamedTool, RunloopConfig, ToolCall, ToolChoice,
};
use runloop_tools::{Terminate, ToolCollection};
use tracing::{info, warn};

use crate::cleanup::ToolCleanup;

const SYSTEM_PROMPT: &str = "You are an agent that can execute tool calls";
const NEXT_STEP_PROMPT: &str =
    "If you want to stop interaction, use `terminate` tool/function call.";

/// Agent whose step asks the model for tool calls, then runs them.
///
/// The cleanup handle is a [`ToolCleanup`] over the same tools, so every
/// tool's resources are released once per run.
pub struct ToolCallAgent {
    core: AgentCore,
    tools: Arc<ToolCollection>,
    tool_choice: ToolChoice,
    special_tools: HashSet<String>,
    tool_calls: Vec<ToolCall>,
    max_observe: Option<usize>,
}

impl std::fmt::Debug for ToolCallAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallAgent")
            .field("core", &self.core)
            .field("tools", &self.tools)
            .field("tool_choice", &self.tool_choice)
            .field("pending_calls", &self.tool_calls.len())
            .finish()
    }
}

impl ToolCallAgent {
    /// Create an agent with the built-in `terminate` tool.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_tools(name, ToolCollection::new().with_tool(Terminate))
    }

    pub fn with_tools(name: impl Into<String>, tools: ToolCollection) -> Self {
        Self::from_core(
            AgentCore::new(name)
                .with_system_prompt(SYSTEM_PROMPT)
                .with_next_step_prompt(NEXT_STEP_PROMPT)
                .with_max_steps(30),
            tools,
        )
    }

    /// Wrap an existing core; its cleanup handle is replaced.
    pub fn from_core(core: AgentCore, tools: ToolCollection) -> Self {
        let tools = Arc::new(tools);
        Self {
            core: core.with_cleanup(Arc::new(ToolCleanup::new(Arc::clone(&tools)))),
            tools,
            tool_choice: ToolChoice::Auto,
            special_tools: HashSet::from([Terminate::NAME.to_string()]),
            tool_calls: Vec::new(),
            max_observe: None,
        }
    }

    pub fn from_config(
        name: impl Into<String>,
        tools: ToolCollection,
        config: &RunloopConfig,
    ) -> AgentResult<Self> {
        let core = AgentCore::from_config(name, config)?
            .with_system_prompt(SYSTEM_PROMPT)
            .with_next_step_prompt(NEXT_STEP_PROMPT);
        Ok(Self::from_core(core, tools).with_max_observe(config.agent.max_observe))
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    /// Tools whose execution finishes the run.
    pub fn with_special_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_tools = names
            .into_iter()
            .map(|name| name.into().to_lowercase())
            .collect();
        self
    }

    pub fn with_max_observe(mut self, max_observe: Option<usize>) -> Self {
        self.max_observe = max_observe;
        self
    }

    pub fn tools(&self) -> &ToolCollection {
        &self.tools
    }

    /// Calls requested by the latest think phase.
    pub fn pending_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    fn is_special_tool(&self, name: &str) -> bool {
        self.special_tools.contains(&name.to_lowercase())
    }

    /// Ask the model for the next move and record it.
    ///
    /// Returns whether there is anything to act on.
    pub async fn think(&mut self) -> AgentResult<bool> {
        if let Some(prompt) = self.core.next_step_prompt.clone() {
            self.core.memory.add(Message::user(prompt));
        }

        let system_msgs: Vec<Message> = self
            .core
            .system_prompt
            .iter()
            .map(|prompt| Message::system(prompt.as_str()))
            .collect();

        let outcome = self
            .core
            .llm
            .ask_tool(
                &self.core.messages(),
                &system_msgs,
                &self.tools.schema_list(),
                self.tool_choice,
            )
            .await;
        let response = match outcome {
            Ok(response) => response,
            Err(LlmError::TokenLimit) => {
                warn!(agent = %self.core.name, "token limit reached; finishing run");
                self.core.memory.add(Message::assistant(
                    "Maximum token limit reached, cannot continue execution",
                ));
                self.core.set_state(AgentState::Finished);
                return Ok(false);
            }
            Err(error) => return Err(error.into()),
        };

        let content = response.content().unwrap_or_default().to_string();
        self.tool_calls = match self.tool_choice {
            ToolChoice::None => Vec::new(),
            _ => response.tool_calls().to_vec(),
        };

        info!(
            agent = %self.core.name,
            tools = self.tool_calls.len(),
            names = ?self.tool_calls.iter().map(ToolCall::name).collect::<Vec<_>>(),
            "model selected tools"
        );

        match self.tool_choice {
            ToolChoice::None => {
                if !response.tool_calls().is_empty() {
                    warn!(agent = %self.core.name, "model requested tools while tool use is disabled");
                }
                if content.is_empty() {
                    return Ok(false);
                }
                self.core.memory.add(Message::assistant(content));
                Ok(true)
            }
            ToolChoice::Auto | ToolChoice::Required => {
                let message = if self.tool_calls.is_empty() {
                    Message::assistant(content.as_str())
                } else {
                    Message::from_tool_calls(self.tool_calls.clone(), content.as_str())
                };
                self.core.memory.add(message);

                if !self.tool_calls.is_empty() {
                    return Ok(true);
                }
                // A required call that never came is reported by `act`.
                Ok(self.tool_choice == ToolChoice::Required || !content.is_empty())
            }
        }
    }

    /// Run the pending tool calls and record their observations.
    pub async fn act(&mut self) -> AgentResult<String> {
        if self.tool_calls.is_empty() {
            if self.tool_choice == ToolChoice::Required {
                return Err(AgentError::step("Tool calls required but none provided"));
            }
            return Ok(self
                .core
                .memory
                .last()
                .and_then(Message::content)
                .unwrap_or("No content or commands to execute")
                .to_string());
        }

        let calls = std::mem::take(&mut self.tool_calls);
        let mut observations = Vec::with_capacity(calls.len());
        for call in &calls {
            let observation = self.execute_tool(call).await;
            let mut message = Message::tool(observation.text.clone(), call.name(), call.id.as_str());
            if let Some(image) = observation.base64_image {
                message = message.with_base64_image(image);
            }
            self.core.memory.add(message);
            observations.push(observation.text);
        }
        Ok(observations.join("\n\n"))
    }

    async fn execute_tool(&mut self, call: &ToolCall) -> Observation {
        let name = call.name();
        info!(agent = %self.core.name, tool = %name, "activating tool");
        let result = self.tools.execute_call(call).await;

        if result.is_success() && self.is_special_tool(name) {
            info!(agent = %self.core.name, tool = %name, "special tool completed the task");
            self.core.set_state(AgentState::Finished);
        }

        let base64_image = result.result().base64_image.clone();
        let rendered = match &result {
            ExecutionResult::Failure(_) => result.to_string(),
            ExecutionResult::Success(output) if output.is_truthy() => {
                format!("Observed output of cmd `{name}` executed:\n{output}")
            }
            ExecutionResult::Success(_) => format!("Cmd `{name}` completed with no output"),
        };

        Observation {
            text: truncate(rendered, self.max_observe),
            base64_image,
        }
    }
}

struct Observation {
    text: String,
    base64_image: Option<String>,
}

fn truncate(text: String, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect(),
        _ => text,
    }
}

#[async_trait]
impl Agent for ToolCallAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn step(&mut self) -> AgentResult<String> {
        if !self.think().await? {
            return Ok("Thinking complete - no action needed".to_string());
        }
        self.act().await
    }
}
