//! Scripted agent and counting cleanup handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use runloop_core::{Agent, AgentCore, AgentError, AgentResult, AgentState, Cleanup};

/// Cleanup handle that counts how often it ran.
///
/// Clones share the counter, so a test can keep one clone and hand the
/// other to an agent.
#[derive(Debug, Clone, Default)]
pub struct CountingCleanup {
    calls: Arc<AtomicUsize>,
}

impl CountingCleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// This handle as an agent dependency.
    pub fn handle(&self) -> Arc<dyn Cleanup> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Cleanup for CountingCleanup {
    async fn cleanup(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Agent whose steps return scripted results, cycling through them.
#[derive(Debug)]
pub struct ScriptedAgent {
    core: AgentCore,
    results: Vec<String>,
    calls: usize,
    finish_on: Option<usize>,
    fail_on: Option<(usize, String)>,
}

impl ScriptedAgent {
    pub fn new<I, S>(core: AgentCore, results: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            core,
            results: results.into_iter().map(Into::into).collect(),
            calls: 0,
            finish_on: None,
            fail_on: None,
        }
    }

    /// Same result on every step.
    pub fn repeating(core: AgentCore, result: impl Into<String>) -> Self {
        Self::new(core, [result.into()])
    }

    /// Set the state to finished on the `call`-th step (1-indexed).
    pub fn finish_on(mut self, call: usize) -> Self {
        self.finish_on = Some(call);
        self
    }

    /// Fail the `call`-th step (1-indexed) with a step error.
    pub fn fail_on(mut self, call: usize, reason: impl Into<String>) -> Self {
        self.fail_on = Some((call, reason.into()));
        self
    }

    /// Steps taken across all runs.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn step(&mut self) -> AgentResult<String> {
        self.calls += 1;
        let calls = self.calls;
        if let Some((_, reason)) = self.fail_on.as_ref().filter(|(call, _)| *call == calls) {
            return Err(AgentError::step(reason.clone()));
        }
        if self.finish_on == Some(self.calls) {
            self.core.set_state(AgentState::Finished);
        }
        if self.results.is_empty() {
            return Ok(String::new());
        }
        Ok(self.results[(self.calls - 1) % self.results.len()].clone())
    }
}
