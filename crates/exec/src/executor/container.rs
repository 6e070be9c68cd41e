//! Container executor - sandboxed runs in Docker containers
//!
//! One fresh container per request; the container is force-removed on
//! every path, success or failure. Durations are measured on the caller's
//! clock: the isolation boundary decouples the container lifecycle from
//! the wait call, so sandboxed durations are not comparable to host
//! process durations.

use crate::executor::command::command_line;
use crate::executor::Executor;
use crate::request::{ExecutionRequest, ExecutionResult};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::Docker;
use clawmate_foundation::{Error, Result};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Container executor configuration
#[derive(Debug, Clone)]
pub struct ContainerExecutorConfig {
    /// Base image for sandboxed runs
    pub image: String,

    /// Timeout applied when the request does not carry one
    pub default_timeout: Duration,
}

impl Default for ContainerExecutorConfig {
    fn default() -> Self {
        Self {
            image: "ubuntu:22.04".to_string(),
            default_timeout: Duration::from_secs(300),
        }
    }
}

/// Container executor that runs requests in disposable Docker containers
pub struct ContainerExecutor {
    /// Docker client; `None` when the daemon is unreachable
    docker: Option<Docker>,

    config: ContainerExecutorConfig,
}

impl ContainerExecutor {
    /// Create a container executor, probing the local Docker daemon
    pub async fn new() -> Self {
        Self::with_config(ContainerExecutorConfig::default()).await
    }

    pub async fn with_config(config: ContainerExecutorConfig) -> Self {
        let docker = match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                if docker.ping().await.is_ok() {
                    Some(docker)
                } else {
                    debug!("Docker daemon did not answer ping");
                    None
                }
            }
            Err(e) => {
                debug!("Docker not available: {}", e);
                None
            }
        };

        Self { docker, config }
    }

    async fn run_in_container(
        &self,
        docker: &Docker,
        request: &ExecutionRequest,
    ) -> Result<(i32, String, String)> {
        let line = command_line(request);
        let env: Vec<String> = request
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let config = Config {
            image: Some(self.config.image.clone()),
            cmd: Some(vec!["sh".to_string(), "-c".to_string(), line]),
            env: Some(env),
            working_dir: request.cwd.as_ref().map(|p| p.display().to_string()),
            host_config: Some(bollard::models::HostConfig {
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: format!("clawmate-{}", Uuid::new_v4()),
            ..Default::default()
        };

        let created = docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| Error::Spawn(format!("Failed to create container: {}", e)))?;
        let container_id = created.id;

        let result = self.wait_and_collect(docker, &container_id, request).await;

        // Removed unconditionally; force also stops a still-running
        // container after a timeout.
        let remove = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        if let Err(e) = docker.remove_container(&container_id, Some(remove)).await {
            warn!("Failed to remove container {}: {}", container_id, e);
        }

        result
    }

    async fn wait_and_collect(
        &self,
        docker: &Docker,
        container_id: &str,
        request: &ExecutionRequest,
    ) -> Result<(i32, String, String)> {
        docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Spawn(format!("Failed to start container: {}", e)))?;

        let timeout = request.timeout().unwrap_or(self.config.default_timeout);
        let mut wait = docker.wait_container(container_id, None::<WaitContainerOptions<String>>);

        let exit_code = match tokio::time::timeout(timeout, wait.next()).await {
            Ok(Some(Ok(body))) => body.status_code as i32,
            Ok(Some(Err(e))) => {
                return Err(Error::Execution(format!("Container wait failed: {}", e)))
            }
            Ok(None) => {
                return Err(Error::Execution(
                    "Container wait ended without a status".to_string(),
                ))
            }
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "Container timed out after {} seconds",
                    timeout.as_secs()
                )))
            }
        };

        // Output is collected once the container has finished
        let logs_options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut logs = docker.logs(container_id, Some(logs_options));
        let mut stdout = String::new();
        let mut stderr = String::new();
        while let Some(frame) = logs.next().await {
            match frame {
                Ok(LogOutput::StdOut { message }) => {
                    stdout.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(LogOutput::StdErr { message }) => {
                    stderr.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to read container logs: {}", e);
                    break;
                }
            }
        }

        Ok((exit_code, stdout, stderr))
    }
}

#[async_trait]
impl Executor for ContainerExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();

        let Some(docker) = &self.docker else {
            return ExecutionResult::failure(
                request.command.clone(),
                "Docker is not available",
                started.elapsed(),
            );
        };

        info!("Running `{}` in a sandbox container", request.command);

        match self.run_in_container(docker, request).await {
            Ok((exit_code, stdout, stderr)) => ExecutionResult {
                command: request.command.clone(),
                exit_code,
                stdout,
                stderr,
                duration: started.elapsed().as_secs_f64(),
                pid: None,
            },
            Err(e) => {
                warn!("Container execution failed: {}", e);
                ExecutionResult::failure(request.command.clone(), e.to_string(), started.elapsed())
            }
        }
    }

    fn is_available(&self) -> bool {
        self.docker.is_some()
    }

    fn name(&self) -> &'static str {
        "container"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_daemon_folds_into_result() {
        let executor = ContainerExecutor::new().await;
        if executor.is_available() {
            return; // exercised below when a daemon is present
        }

        let result = executor.execute(&ExecutionRequest::new("echo hi")).await;
        assert_eq!(result.exit_code, -1);
        assert!(result.stderr.contains("Docker is not available"));
    }

    #[tokio::test]
    async fn test_echo_in_container() {
        let executor = ContainerExecutor::new().await;
        if !executor.is_available() {
            return;
        }

        let result = executor.execute(&ExecutionRequest::new("echo hi")).await;
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hi"));
        assert!(result.pid.is_none());
    }

    #[tokio::test]
    async fn test_executor_name() {
        let executor = ContainerExecutor::new().await;
        assert_eq!(executor.name(), "container");
    }
}
