//! Execution request and result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A request to run one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Command line to run; `args` are appended shell-safely
    pub command: String,

    /// Ordered arguments appended to the command
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Environment overrides merged onto the inherited environment
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Wall-clock budget in seconds; executor default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Run under a terminal-allocating wrapper
    #[serde(default)]
    pub pty: bool,

    /// Elevated privileges requested; consumed by the delivery layer's
    /// approval flow, not by the executors
    #[serde(default)]
    pub elevated: bool,

    /// Route to the container sandbox backend
    #[serde(default)]
    pub sandbox: bool,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            timeout_secs: None,
            pty: false,
            elevated: false,
            sandbox: false,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add one environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_pty(mut self, pty: bool) -> Self {
        self.pty = pty;
        self
    }

    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Requested timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Result of one execution attempt
///
/// `exit_code == -1` means the process never ran to normal completion:
/// spawn failure, timeout kill, or death by signal. For sandboxed runs the
/// `duration` is measured on the caller's clock and is not directly
/// comparable to host process durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Elapsed wall time in seconds
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl ExecutionResult {
    /// Result for an attempt that never completed normally
    pub fn failure(
        command: impl Into<String>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code: -1,
            stdout: String::new(),
            stderr: message.into(),
            duration: elapsed.as_secs_f64(),
            pid: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Which process stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOrigin {
    Stdout,
    Stderr,
}

/// One completed line from exactly one of the process streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputChunk {
    pub origin: StreamOrigin,
    pub text: String,
}

impl OutputChunk {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            origin: StreamOrigin::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            origin: StreamOrigin::Stderr,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: ExecutionRequest = serde_json::from_str(r#"{"command":"ls"}"#).unwrap();
        assert_eq!(request.command, "ls");
        assert!(request.args.is_empty());
        assert!(request.env.is_empty());
        assert!(!request.pty);
        assert!(!request.sandbox);
        assert_eq!(request.timeout(), None);
    }

    #[test]
    fn test_request_builder() {
        let request = ExecutionRequest::new("echo")
            .with_args(vec!["hi".to_string()])
            .with_timeout(Duration::from_secs(5))
            .with_sandbox(true);
        assert_eq!(request.timeout(), Some(Duration::from_secs(5)));
        assert!(request.sandbox);
    }

    #[test]
    fn test_failure_result_sentinel() {
        let result = ExecutionResult::failure("ls", "no such directory", Duration::from_millis(3));
        assert_eq!(result.exit_code, -1);
        assert!(!result.is_success());
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "no such directory");
        assert!(result.pid.is_none());
    }

    #[test]
    fn test_chunk_origins() {
        let chunk = OutputChunk::stderr("warning");
        assert_eq!(chunk.origin, StreamOrigin::Stderr);
        let raw = serde_json::to_string(&chunk).unwrap();
        assert!(raw.contains(r#""origin":"stderr""#));
    }
}
