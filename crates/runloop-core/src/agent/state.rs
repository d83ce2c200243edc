//! Agent lifecycle state and scoped transitions.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::Agent;
use crate::error::AgentError;

/// Externally observable lifecycle of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Initial and resting state; the only state `run` accepts.
    #[default]
    Idle,
    Running,
    /// Set by a step to end the loop after the current iteration.
    Finished,
    /// Reserved for explicit scoped transitions; never entered by a failed step.
    Error,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Idle => "IDLE",
            AgentState::Running => "RUNNING",
            AgentState::Finished => "FINISHED",
            AgentState::Error => "ERROR",
        }
    }

    pub fn all() -> &'static [AgentState] {
        &[
            AgentState::Idle,
            AgentState::Running,
            AgentState::Finished,
            AgentState::Error,
        ]
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentState {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AgentState::all()
            .iter()
            .copied()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| AgentError::InvalidState {
                value: value.to_string(),
            })
    }
}

impl TryFrom<&str> for AgentState {
    type Error = AgentError;

    fn try_from(value: &str) -> Result<Self, <AgentState as TryFrom<&str>>::Error> {
        value.parse()
    }
}

impl TryFrom<String> for AgentState {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self, <AgentState as TryFrom<String>>::Error> {
        value.parse()
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: AgentState,
    current_step: usize,
}

/// Shared cell holding an agent's state and step counter.
///
/// Guards keep a handle to the cell rather than a borrow of the agent, so
/// they can restore it from `Drop` while the agent is mutably borrowed by
/// the protected block. Locks are never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct LifecycleCell {
    inner: Arc<Mutex<Lifecycle>>,
}

impl LifecycleCell {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AgentState {
        self.lock().state
    }

    pub fn set_state(&self, state: AgentState) {
        self.lock().state = state;
    }

    /// Replace the state, returning the previous one.
    pub fn swap_state(&self, state: AgentState) -> AgentState {
        std::mem::replace(&mut self.lock().state, state)
    }

    pub fn current_step(&self) -> usize {
        self.lock().current_step
    }

    pub fn set_current_step(&self, step: usize) {
        self.lock().current_step = step;
    }

    /// Advance the step counter and return the new 1-indexed step.
    pub fn advance_step(&self) -> usize {
        let mut lifecycle = self.lock();
        lifecycle.current_step += 1;
        lifecycle.current_step
    }
}

/// Restores the prior state when dropped.
///
/// Dropping covers normal exit, early return through `?`, unwinding, and
/// cancellation of the enclosing future.
#[must_use = "the prior state is restored when the guard is dropped"]
pub(crate) struct StateGuard {
    cell: LifecycleCell,
    prior: AgentState,
}

impl StateGuard {
    pub(crate) fn enter(cell: &LifecycleCell, new_state: AgentState) -> Self {
        let prior = cell.swap_state(new_state);
        tracing::debug!(from = %prior, to = %new_state, "entered state");
        Self {
            cell: cell.clone(),
            prior,
        }
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        let left = self.cell.swap_state(self.prior);
        tracing::debug!(from = %left, to = %self.prior, "restored state");
    }
}

/// Resets the step counter to zero when dropped.
#[must_use = "the step counter is reset when the guard is dropped"]
pub(crate) struct StepReset {
    cell: LifecycleCell,
}

impl StepReset {
    pub(crate) fn new(cell: &LifecycleCell) -> Self {
        Self { cell: cell.clone() }
    }
}

impl Drop for StepReset {
    fn drop(&mut self) {
        self.cell.set_current_step(0);
    }
}

/// Run `body` with the agent temporarily in `new_state`.
///
/// `new_state` is validated before anything is mutated: a value that does
/// not name an [`AgentState`] fails with [`AgentError::InvalidState`] and
/// leaves the agent untouched. Once entered, the prior state is restored on
/// every exit path, and an error returned by `body` is passed through
/// unchanged.
///
/// # Example
///
/// ```rust
/// use futures::FutureExt;
/// use runloop_core::agent::{state_context, AgentState};
/// # use runloop_core::{Agent, AgentCore, AgentError};
/// # struct Quiet(AgentCore);
/// # #[async_trait::async_trait]
/// # impl Agent for Quiet {
/// #     fn core(&self) -> &AgentCore { &self.0 }
/// #     fn core_mut(&mut self) -> &mut AgentCore { &mut self.0 }
/// #     async fn step(&mut self) -> Result<String, AgentError> { Ok(String::new()) }
/// # }
/// # tokio_test::block_on(async {
/// let mut agent = Quiet(AgentCore::new("quiet"));
///
/// let seen = state_context(&mut agent, AgentState::Running, |agent| {
///     async move { Ok::<_, AgentError>(agent.core().state()) }.boxed()
/// })
/// .await
/// .unwrap();
///
/// assert_eq!(seen, AgentState::Running);
/// assert_eq!(agent.core().state(), AgentState::Idle);
/// # });
/// ```
pub async fn state_context<A, S, T, E, F>(agent: &mut A, new_state: S, body: F) -> Result<T, E>
where
    A: Agent + ?Sized,
    S: TryInto<AgentState>,
    S::Error: Into<AgentError>,
    E: From<AgentError>,
    F: for<'a> FnOnce(&'a mut A) -> BoxFuture<'a, Result<T, E>>,
{
    let new_state: AgentState = match new_state.try_into() {
        Ok(state) => state,
        Err(error) => {
            let error: AgentError = error.into();
            tracing::warn!(%error, "rejected scoped transition");
            return Err(E::from(error));
        }
    };

    let _guard = StateGuard::enter(agent.core().lifecycle(), new_state);
    body(agent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IDLE", AgentState::Idle)]
    #[case("RUNNING", AgentState::Running)]
    #[case("FINISHED", AgentState::Finished)]
    #[case("ERROR", AgentState::Error)]
    fn parses_wire_names(#[case] name: &str, #[case] expected: AgentState) {
        assert_eq!(name.parse::<AgentState>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[rstest]
    #[case("running")]
    #[case("")]
    #[case("PAUSED")]
    fn rejects_unknown_names(#[case] name: &str) {
        let error = AgentState::try_from(name).unwrap_err();
        assert_eq!(error.to_string(), format!("Invalid state: {name}"));
    }

    #[test]
    fn guard_restores_prior_state_on_drop() {
        let cell = LifecycleCell::default();
        {
            let _guard = StateGuard::enter(&cell, AgentState::Running);
            assert_eq!(cell.state(), AgentState::Running);
            cell.set_state(AgentState::Finished);
        }
        assert_eq!(cell.state(), AgentState::Idle);
    }

    #[test]
    fn guard_restores_state_during_unwind() {
        let cell = LifecycleCell::default();
        let inner = cell.clone();
        let outcome = std::panic::catch_unwind(move || {
            let _guard = StateGuard::enter(&inner, AgentState::Running);
            panic!("step exploded");
        });
        assert!(outcome.is_err());
        assert_eq!(cell.state(), AgentState::Idle);
    }

    #[test]
    fn step_reset_zeroes_counter() {
        let cell = LifecycleCell::default();
        {
            let _reset = StepReset::new(&cell);
            assert_eq!(cell.advance_step(), 1);
            assert_eq!(cell.advance_step(), 2);
        }
        assert_eq!(cell.current_step(), 0);
    }
}
