//! Agent lifecycle state machine

use serde::{Deserialize, Serialize};

/// Lifecycle states of an agent task
///
/// Transitions are monotonic: `Idle` → `Running` → one of the terminal
/// states. A terminal handle never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    /// Registered, waiting for a concurrency slot
    Idle,

    /// Dispatched and executing
    Running,

    /// Finished successfully
    Completed,

    /// Finished with an error
    Failed,

    /// Cancelled before completion
    Cancelled,
}

impl AgentState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentState::Completed | AgentState::Failed | AgentState::Cancelled
        )
    }

    /// Check if the task body is currently executing
    pub fn is_running(&self) -> bool {
        matches!(self, AgentState::Running)
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentState::Idle => "Idle",
            AgentState::Running => "Running",
            AgentState::Completed => "Completed",
            AgentState::Failed => "Failed",
            AgentState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
