//! Shell executor - runs commands directly on the host
//!
//! Features:
//! - Timeout with guaranteed kill-and-reap before returning
//! - Line-granular stdout/stderr streaming
//! - Spawn failures folded into the result, never raised

use crate::executor::command::build_command;
use crate::executor::Executor;
use crate::request::{ExecutionRequest, ExecutionResult, OutputChunk, StreamOrigin};
use async_stream::stream;
use async_trait::async_trait;
use clawmate_foundation::{Error, Result};
use futures::Stream;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Shell executor configuration
#[derive(Debug, Clone)]
pub struct ShellExecutorConfig {
    /// Timeout applied when the request does not carry one
    pub default_timeout: Duration,
}

impl Default for ShellExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(300),
        }
    }
}

/// Shell executor that runs requests as host processes
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    config: ShellExecutorConfig,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self {
            config: ShellExecutorConfig::default(),
        }
    }

    pub fn with_config(config: ShellExecutorConfig) -> Self {
        Self { config }
    }

    /// Check if a command resolves on PATH
    pub fn is_command_available(command: &str) -> bool {
        which::which(command).is_ok()
    }

    fn spawn(request: &ExecutionRequest) -> std::io::Result<Child> {
        let argv = build_command(request);

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Overrides merge onto the inherited environment
        cmd.envs(&request.env);

        if let Some(cwd) = &request.cwd {
            cmd.current_dir(cwd);
        }

        cmd.spawn()
    }

    /// Stream line-granular output chunks from both process streams.
    ///
    /// Each chunk is one completed line from exactly one stream; chunks are
    /// never merged across streams. The sequence ends once both streams hit
    /// end-of-file and the exit status has been collected. A spawn or read
    /// failure is delivered as a final `Err` element after the child has
    /// been killed.
    pub fn stream(
        &self,
        request: ExecutionRequest,
    ) -> impl Stream<Item = Result<OutputChunk>> + Send {
        stream! {
            let mut child = match Self::spawn(&request) {
                Ok(child) => child,
                Err(e) => {
                    yield Err(Error::Spawn(format!("Failed to spawn process: {}", e)));
                    return;
                }
            };

            let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
                (Some(stdout), Some(stderr)) => (stdout, stderr),
                _ => {
                    let _ = child.kill().await;
                    yield Err(Error::Internal("Process pipes were not captured".to_string()));
                    return;
                }
            };

            let mut stdout_lines = BufReader::new(stdout).lines();
            let mut stderr_lines = BufReader::new(stderr).lines();
            let mut stdout_done = false;
            let mut stderr_done = false;

            // Waits on whichever stream produces next, so a stream that goes
            // quiet cannot stall delivery from the other, and no cycles are
            // burned while both are idle.
            loop {
                let (origin, line) = tokio::select! {
                    line = stdout_lines.next_line(), if !stdout_done => (StreamOrigin::Stdout, line),
                    line = stderr_lines.next_line(), if !stderr_done => (StreamOrigin::Stderr, line),
                    else => break,
                };

                match line {
                    Ok(Some(text)) => yield Ok(OutputChunk { origin, text }),
                    Ok(None) => match origin {
                        StreamOrigin::Stdout => stdout_done = true,
                        StreamOrigin::Stderr => stderr_done = true,
                    },
                    Err(e) => {
                        let _ = child.kill().await;
                        yield Err(Error::Io(e));
                        return;
                    }
                }
            }

            // Both streams are drained; collect the exit status so the
            // child is reaped before the sequence ends.
            match child.wait().await {
                Ok(status) => debug!("Streamed command exited with {:?}", status.code()),
                Err(e) => yield Err(Error::Execution(format!("Failed to collect exit status: {}", e))),
            }
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();

        let mut child = match Self::spawn(request) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn `{}`: {}", request.command, e);
                return ExecutionResult::failure(
                    request.command.clone(),
                    format!("Failed to spawn process: {}", e),
                    started.elapsed(),
                );
            }
        };

        let pid = child.id();
        debug!("Executing `{}` (pid {:?})", request.command, pid);

        // Drain both pipes concurrently so a full pipe buffer cannot wedge
        // the child while we wait on it.
        let stdout_task = child.stdout.take().map(|mut out| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf).await;
                buf
            })
        });
        let stderr_task = child.stderr.take().map(|mut err| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf).await;
                buf
            })
        });

        let timeout = request.timeout().unwrap_or(self.config.default_timeout);

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return ExecutionResult::failure(
                    request.command.clone(),
                    format!("Failed to wait for process: {}", e),
                    started.elapsed(),
                );
            }
            Err(_) => {
                // kill() signals the child and then reaps it, so the
                // process is gone from the process table before we return.
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out process: {}", e);
                }
                let mut result = ExecutionResult::failure(
                    request.command.clone(),
                    format!("Command timed out after {} seconds", timeout.as_secs()),
                    started.elapsed(),
                );
                result.pid = pid;
                return result;
            }
        };

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        ExecutionResult {
            command: request.command.clone(),
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration: started.elapsed().as_secs_f64(),
            pid,
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_echo_captures_stdout() {
        let executor = ShellExecutor::new();
        let result = executor.execute(&ExecutionRequest::new("echo hi")).await;

        assert_eq!(result.exit_code, 0);
        assert!(result.is_success());
        if !cfg!(windows) {
            assert_eq!(result.stdout, "hi\n");
            assert_eq!(result.stderr, "");
        }
        assert!(result.pid.is_some());
        assert!(result.duration >= 0.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_is_kept_separate() {
        let executor = ShellExecutor::new();
        let result = executor
            .execute(&ExecutionRequest::new("echo out; echo err 1>&2"))
            .await;

        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_code_is_reported() {
        let executor = ShellExecutor::new();
        let result = executor.execute(&ExecutionRequest::new("exit 3")).await;
        assert_eq!(result.exit_code, 3);
        assert!(!result.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_overrides_are_applied() {
        let executor = ShellExecutor::new();
        let request =
            ExecutionRequest::new("echo $CLAWMATE_TEST_VALUE").with_env("CLAWMATE_TEST_VALUE", "42");
        let result = executor.execute(&request).await;
        assert_eq!(result.stdout, "42\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_and_reports() {
        let executor = ShellExecutor::new();
        let request =
            ExecutionRequest::new("sleep 5").with_timeout(Duration::from_secs(1));
        let started = Instant::now();
        let result = executor.execute(&request).await;

        assert_eq!(result.exit_code, -1);
        assert!(result.stderr.contains("timed out"));
        assert!(result.duration >= 1.0);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_bad_cwd_folds_into_result() {
        let executor = ShellExecutor::new();
        let request =
            ExecutionRequest::new("echo hi").with_cwd("/definitely/not/a/real/directory");
        let result = executor.execute(&request).await;

        assert_eq!(result.exit_code, -1);
        assert!(result.stderr.contains("Failed to spawn"));
        assert!(result.pid.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_yields_lines_in_order() {
        let executor = ShellExecutor::new();
        let request = ExecutionRequest::new("echo one; echo two; echo three");
        let chunks: Vec<_> = executor.stream(request).collect().await;

        let lines: Vec<String> = chunks
            .into_iter()
            .map(|c| c.expect("stream chunk"))
            .map(|c| c.text)
            .collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_separates_origins() {
        let executor = ShellExecutor::new();
        let request = ExecutionRequest::new("echo out; echo err 1>&2");
        let chunks: Vec<_> = executor
            .stream(request)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(|c| c.expect("stream chunk"))
            .collect();

        assert_eq!(chunks.len(), 2);
        assert!(chunks
            .iter()
            .any(|c| c.origin == StreamOrigin::Stdout && c.text == "out"));
        assert!(chunks
            .iter()
            .any(|c| c.origin == StreamOrigin::Stderr && c.text == "err"));
    }

    #[tokio::test]
    async fn test_stream_spawn_failure_is_final_error() {
        let executor = ShellExecutor::new();
        let request =
            ExecutionRequest::new("echo hi").with_cwd("/definitely/not/a/real/directory");
        let chunks: Vec<_> = executor.stream(request).collect().await;

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_err());
    }

    #[test]
    fn test_command_availability() {
        if !cfg!(windows) {
            assert!(ShellExecutor::is_command_available("sh"));
        }
        assert!(!ShellExecutor::is_command_available(
            "clawmate-no-such-binary"
        ));
    }
}
