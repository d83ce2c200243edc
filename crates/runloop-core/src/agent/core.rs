//! # Agent Core
//!
//! Shared agent data and the bounded run loop that drives a decision hook.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use super::state::{AgentState, LifecycleCell, StepReset, state_context};
use crate::cleanup::{Cleanup, NoopCleanup};
use crate::config::RunloopConfig;
use crate::error::{AgentError, AgentResult, MemoryResult};
use crate::llm::{LanguageModel, LlmClient};
use crate::memory::ConversationMemory;
use crate::message::{Message, Role};
use crate::stall::{DEFAULT_DUPLICATE_THRESHOLD, STALL_NOTICE, StallDetector};

/// Step limit used when none is configured.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Data every agent carries, independent of its decision hook.
///
/// `llm` and `memory` are public so owners can rebind them; call
/// [`AgentCore::ensure_dependencies`] afterwards to re-check them.
pub struct AgentCore {
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    /// Guidance handed to the model before each step.
    pub next_step_prompt: Option<String>,
    pub llm: Arc<dyn LanguageModel>,
    pub memory: ConversationMemory,
    pub max_steps: usize,
    /// Equal assistant outputs needed before the loop counts as stalled.
    pub duplicate_threshold: usize,
    cleanup: Arc<dyn Cleanup>,
    lifecycle: LifecycleCell,
}

impl fmt::Debug for AgentCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentCore")
            .field("name", &self.name)
            .field("model", &self.llm.model_name())
            .field("messages", &self.memory.len())
            .field("max_steps", &self.max_steps)
            .field("state", &self.state())
            .field("current_step", &self.current_step())
            .finish_non_exhaustive()
    }
}

impl AgentCore {
    /// Create an idle agent core with default dependencies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            system_prompt: None,
            next_step_prompt: None,
            llm: Arc::new(LlmClient::default()),
            memory: ConversationMemory::default(),
            max_steps: DEFAULT_MAX_STEPS,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            cleanup: Arc::new(NoopCleanup),
            lifecycle: LifecycleCell::default(),
        }
    }

    /// Build a core from validated configuration.
    pub fn from_config(name: impl Into<String>, config: &RunloopConfig) -> AgentResult<Self> {
        config.validate()?;
        let llm = LlmClient::new(config.llm.clone())?;
        Ok(Self::new(name)
            .with_llm(Arc::new(llm))
            .with_memory(ConversationMemory::with_capacity(config.agent.max_messages))
            .with_max_steps(config.agent.max_steps)
            .with_duplicate_threshold(config.agent.duplicate_threshold))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_next_step_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.next_step_prompt = Some(prompt.into());
        self
    }

    /// Bind the language model, replacing it with the default client if it
    /// does not conform.
    pub fn with_llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = llm;
        self.ensure_dependencies();
        self
    }

    /// Bind the memory, replacing it with a default memory if it does not
    /// conform.
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self.ensure_dependencies();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_duplicate_threshold(mut self, threshold: usize) -> Self {
        self.duplicate_threshold = threshold;
        self
    }

    pub fn with_cleanup(mut self, cleanup: Arc<dyn Cleanup>) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Replace non-conforming dependencies with fresh defaults.
    ///
    /// Returns `true` if anything was replaced.
    pub fn ensure_dependencies(&mut self) -> bool {
        let mut replaced = false;
        if !self.llm.conforms() {
            tracing::warn!(agent = %self.name, "language model does not conform; using default client");
            self.llm = Arc::new(LlmClient::default());
            replaced = true;
        }
        if !self.memory.conforms() {
            tracing::warn!(agent = %self.name, "memory does not conform; using default memory");
            self.memory = ConversationMemory::default();
            replaced = true;
        }
        replaced
    }

    pub fn state(&self) -> AgentState {
        self.lifecycle.state()
    }

    pub fn set_state(&mut self, state: AgentState) {
        self.lifecycle.set_state(state);
    }

    pub fn current_step(&self) -> usize {
        self.lifecycle.current_step()
    }

    pub(crate) fn lifecycle(&self) -> &LifecycleCell {
        &self.lifecycle
    }

    pub fn cleanup_handle(&self) -> Arc<dyn Cleanup> {
        Arc::clone(&self.cleanup)
    }

    /// Append an entry built for `role`.
    pub fn update_memory(
        &mut self,
        role: Role,
        content: Option<String>,
        base64_image: Option<String>,
    ) {
        let message = Message::for_role(role, content);
        let message = match base64_image {
            Some(image) => message.with_base64_image(image),
            None => message,
        };
        self.memory.add(message);
    }

    /// Append an entry for a role given by its wire name.
    pub fn update_memory_named(
        &mut self,
        role: &str,
        content: Option<String>,
        base64_image: Option<String>,
    ) -> MemoryResult<()> {
        let role = role.parse::<Role>()?;
        self.update_memory(role, content, base64_image);
        Ok(())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.memory.to_vec()
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.memory.replace_all(messages);
    }

    pub fn is_stuck(&self) -> bool {
        StallDetector::new(self.duplicate_threshold).is_stuck(&self.memory)
    }

    /// Prepend the stall notice to the next-step prompt, once.
    pub fn handle_stuck_state(&mut self) {
        let prompt = self.next_step_prompt.take().unwrap_or_default();
        if prompt.contains(STALL_NOTICE) {
            self.next_step_prompt = Some(prompt);
            return;
        }
        tracing::warn!(agent = %self.name, "agent detected stuck state, added prompt: {STALL_NOTICE}");
        self.next_step_prompt = Some(format!("{STALL_NOTICE}\n{prompt}"));
    }
}

/// An agent: shared core data plus a per-iteration decision hook.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use runloop_core::{Agent, AgentCore, AgentError, AgentState};
///
/// struct Countdown {
///     core: AgentCore,
///     left: usize,
/// }
///
/// #[async_trait]
/// impl Agent for Countdown {
///     fn core(&self) -> &AgentCore {
///         &self.core
///     }
///
///     fn core_mut(&mut self) -> &mut AgentCore {
///         &mut self.core
///     }
///
///     async fn step(&mut self) -> Result<String, AgentError> {
///         self.left -= 1;
///         if self.left == 0 {
///             self.core.set_state(AgentState::Finished);
///         }
///         Ok(format!("{} left", self.left))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let mut agent = Countdown { core: AgentCore::new("countdown"), left: 2 };
/// let output = agent.run(None).await.unwrap();
/// assert_eq!(output, "Step 1: 1 left\nStep 2: 0 left");
/// assert_eq!(agent.core().state(), AgentState::Idle);
/// # });
/// ```
#[async_trait]
pub trait Agent: Send {
    fn core(&self) -> &AgentCore;

    fn core_mut(&mut self) -> &mut AgentCore;

    /// Produce one step's textual result.
    ///
    /// May set the state to [`AgentState::Finished`] to end the run after
    /// this step.
    async fn step(&mut self) -> AgentResult<String>;

    /// Drive the step loop from idle; see [`run_agent`].
    async fn run(&mut self, request: Option<&str>) -> AgentResult<String> {
        run_agent(self, request).await
    }
}

/// Run `agent` for up to `max_steps` steps.
///
/// Fails with [`AgentError::IllegalState`] before any side effect unless
/// the agent is idle. On every exit path the state returns to idle, the
/// step counter returns to zero, and the cleanup handle runs once.
pub async fn run_agent<A>(agent: &mut A, request: Option<&str>) -> AgentResult<String>
where
    A: Agent + ?Sized,
{
    let state = agent.core().state();
    if state != AgentState::Idle {
        tracing::warn!(agent = %agent.core().name, %state, "refusing to start a run");
        return Err(AgentError::IllegalState { state });
    }

    let cleanup = agent.core().cleanup_handle();
    let outcome = {
        let _reset = StepReset::new(agent.core().lifecycle());
        if let Some(request) = request {
            agent
                .core_mut()
                .update_memory(Role::User, Some(request.to_string()), None);
        }
        state_context(agent, AgentState::Running, |agent| {
            drive_steps(agent).boxed()
        })
        .await
    };

    cleanup.cleanup().await;

    match &outcome {
        Ok(_) => tracing::info!(agent = %agent.core().name, "run completed"),
        Err(error) => tracing::error!(agent = %agent.core().name, %error, "run failed"),
    }
    outcome
}

async fn drive_steps<A>(agent: &mut A) -> AgentResult<String>
where
    A: Agent + ?Sized,
{
    let max_steps = agent.core().max_steps;
    let mut results = Vec::new();

    while agent.core().current_step() < max_steps
        && agent.core().state() != AgentState::Finished
    {
        let step = agent.core().lifecycle().advance_step();
        tracing::info!(agent = %agent.core().name, step, max_steps, "executing step");

        if agent.core().is_stuck() {
            agent.core_mut().handle_stuck_state();
        }

        let result = agent.step().await?;
        results.push(format!("Step {step}: {result}"));
    }

    if results.is_empty() {
        return Ok("No steps executed".to_string());
    }

    if agent.core().state() != AgentState::Finished {
        tracing::info!(agent = %agent.core().name, max_steps, "reached max steps");
        results.push(format!("Terminated: Reached max steps ({max_steps})"));
    }

    Ok(results.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmResult, MemoryError, MessageError};
    use crate::llm::ToolChoice;
    use crate::tool::ToolSchema;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        core: AgentCore,
        reply: &'static str,
    }

    #[async_trait]
    impl Agent for Fixed {
        fn core(&self) -> &AgentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut AgentCore {
            &mut self.core
        }

        async fn step(&mut self) -> AgentResult<String> {
            Ok(self.reply.to_string())
        }
    }

    struct Failing {
        core: AgentCore,
    }

    #[async_trait]
    impl Agent for Failing {
        fn core(&self) -> &AgentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut AgentCore {
            &mut self.core
        }

        async fn step(&mut self) -> AgentResult<String> {
            Err(AgentError::step("model unreachable"))
        }
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Cleanup for Counter {
        async fn cleanup(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Nameless;

    #[async_trait]
    impl LanguageModel for Nameless {
        fn model_name(&self) -> &str {
            ""
        }

        async fn ask(&self, _: &[Message], _: &[Message]) -> LlmResult<String> {
            Ok(String::new())
        }

        async fn ask_tool(
            &self,
            _: &[Message],
            _: &[Message],
            _: &[ToolSchema],
            _: ToolChoice,
        ) -> LlmResult<Message> {
            Ok(Message::assistant_empty())
        }
    }

    fn fixed(reply: &'static str) -> Fixed {
        Fixed {
            core: AgentCore::new("TestAgent")
                .with_system_prompt("System prompt")
                .with_next_step_prompt("Next step prompt"),
            reply,
        }
    }

    #[tokio::test]
    async fn test_run_max_steps() {
        let counter = Arc::new(Counter::default());
        let mut agent = fixed("Mock step result");
        agent.core.max_steps = 2;
        agent.core = agent.core.with_cleanup(counter.clone());

        let output = agent.run(None).await.unwrap();

        assert_eq!(
            output,
            "Step 1: Mock step result\nStep 2: Mock step result\nTerminated: Reached max steps (2)"
        );
        assert_eq!(agent.core.current_step(), 0);
        assert_eq!(agent.core.state(), AgentState::Idle);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_steps() {
        let mut agent = fixed("unused");
        agent.core.max_steps = 0;
        assert_eq!(agent.run(None).await.unwrap(), "No steps executed");
    }

    #[tokio::test]
    async fn test_failed_step_resets_and_cleans_up() {
        let counter = Arc::new(Counter::default());
        let mut agent = Failing {
            core: AgentCore::new("Failing").with_cleanup(counter.clone()),
        };

        let error = agent.run(Some("go")).await.unwrap_err();

        assert!(matches!(error, AgentError::Step { .. }));
        assert_eq!(agent.core.state(), AgentState::Idle);
        assert_eq!(agent.core.current_step(), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_rejected_when_not_idle() {
        let counter = Arc::new(Counter::default());
        let mut agent = fixed("unused");
        agent.core = agent.core.with_cleanup(counter.clone());
        agent.core.set_state(AgentState::Running);

        let error = agent.run(Some("ignored")).await.unwrap_err();

        assert_eq!(error.to_string(), "Cannot run agent from state: RUNNING");
        assert_eq!(agent.core.state(), AgentState::Running);
        assert!(agent.core.memory.is_empty());
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stall_notice_is_added_once() {
        let mut core = AgentCore::new("stall").with_next_step_prompt("Next step prompt");
        core.handle_stuck_state();
        core.handle_stuck_state();

        let prompt = core.next_step_prompt.unwrap();
        assert_eq!(prompt.matches(STALL_NOTICE).count(), 1);
        assert!(prompt.ends_with("Next step prompt"));
    }

    #[test]
    fn test_update_memory_unsupported_role() {
        let mut core = AgentCore::new("memory");
        let error = core
            .update_memory_named("unsupported", Some("Content".into()), None)
            .unwrap_err();
        assert_eq!(
            error,
            MemoryError::Message(MessageError::UnsupportedRole("unsupported".into()))
        );
        assert_eq!(error.to_string(), "Unsupported message role: unsupported");
        assert!(core.memory.is_empty());
    }

    #[test]
    fn test_ensure_dependencies_replaces_nonconforming() {
        let mut core = AgentCore::new("heal");
        core.llm = Arc::new(Nameless);
        core.memory = ConversationMemory::with_capacity(0);

        assert!(core.ensure_dependencies());
        assert!(core.llm.conforms());
        assert!(core.memory.conforms());
        assert!(!core.ensure_dependencies());
    }
}
