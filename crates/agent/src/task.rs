//! Agent task definition and result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Work carried by an agent task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Free-text prompt for the model
    Prompt { prompt: String },

    /// Shell command with arguments
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// A task submitted to the orchestrator; immutable after submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    /// Caller-supplied identifier, unique for the orchestrator's lifetime
    pub task_id: String,

    /// Prompt or command payload
    pub payload: TaskPayload,

    /// Model override for prompt tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Wall-clock budget in seconds; orchestrator default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Route command payloads through the container sandbox
    #[serde(default)]
    pub sandbox: bool,

    /// Elevated privileges requested
    #[serde(default)]
    pub elevated: bool,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AgentTask {
    /// Create a prompt task
    pub fn prompt(task_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            payload: TaskPayload::Prompt {
                prompt: prompt.into(),
            },
            model: None,
            timeout_secs: None,
            sandbox: false,
            elevated: false,
            created_at: Utc::now(),
        }
    }

    /// Create a shell command task
    pub fn command(task_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            payload: TaskPayload::Command {
                command: command.into(),
                args: Vec::new(),
            },
            model: None,
            timeout_secs: None,
            sandbox: false,
            elevated: false,
            created_at: Utc::now(),
        }
    }

    /// Set command arguments; no effect on prompt tasks
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        if let TaskPayload::Command { args: slot, .. } = &mut self.payload {
            *slot = args;
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Requested timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Terminal result of one agent task; recorded exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub task_id: String,
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds from dispatch to the terminal transition
    pub duration: f64,
}

impl AgentResult {
    pub fn ok(task_id: impl Into<String>, output: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            output: output.into(),
            error: None,
            duration: elapsed.as_secs_f64(),
        }
    }

    pub fn failed(task_id: impl Into<String>, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            output: String::new(),
            error: Some(error.into()),
            duration: elapsed.as_secs_f64(),
        }
    }

    /// Result for an actively cancelled task; any partial output is
    /// discarded rather than recorded.
    pub fn cancelled(task_id: impl Into<String>, elapsed: Duration) -> Self {
        Self::failed(task_id, "Task cancelled", elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_task_builder() {
        let task = AgentTask::command("t-1", "echo")
            .with_args(vec!["hi".to_string()])
            .with_timeout(Duration::from_secs(30))
            .with_sandbox(true);

        assert_eq!(task.task_id, "t-1");
        assert_eq!(task.timeout(), Some(Duration::from_secs(30)));
        assert!(task.sandbox);
        match &task.payload {
            TaskPayload::Command { command, args } => {
                assert_eq!(command, "echo");
                assert_eq!(args, &["hi"]);
            }
            _ => panic!("expected command payload"),
        }
    }

    #[test]
    fn test_with_args_ignores_prompt_payloads() {
        let task = AgentTask::prompt("t-2", "hello").with_args(vec!["x".to_string()]);
        assert!(matches!(task.payload, TaskPayload::Prompt { .. }));
    }

    #[test]
    fn test_payload_serialization_is_tagged() {
        let task = AgentTask::prompt("t-3", "summarize this").with_model("llama3.2");
        let raw = serde_json::to_string(&task).unwrap();
        assert!(raw.contains(r#""type":"prompt""#));
        assert!(raw.contains(r#""model":"llama3.2""#));

        let parsed: AgentTask = serde_json::from_str(&raw).unwrap();
        assert!(matches!(parsed.payload, TaskPayload::Prompt { .. }));
    }

    #[test]
    fn test_cancelled_result_shape() {
        let result = AgentResult::cancelled("t-4", Duration::from_millis(250));
        assert!(!result.success);
        assert!(result.output.is_empty());
        assert!(result.error.as_deref().unwrap().contains("cancelled"));
        assert!(result.duration > 0.2 && result.duration < 0.3);
    }
}
