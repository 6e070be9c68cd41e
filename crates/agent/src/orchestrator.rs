//! Agent orchestrator - bounded-concurrency task scheduling
//!
//! Wraps shell executions, sandboxed executions, and model calls as
//! uniformly awaitable task bodies behind a counting gate. Each submitted
//! task gets a registry handle whose state only moves forward; every
//! failure inside a body is folded into a terminal result rather than
//! propagated to the caller.

use crate::state::AgentState;
use crate::store::ResultStore;
use crate::task::{AgentResult, AgentTask, TaskPayload};
use clawmate_exec::{
    ContainerExecutor, ContainerExecutorConfig, ExecutionRequest, ExecutionResult, Executor,
    ExecutorRegistry, ShellExecutor, ShellExecutorConfig,
};
use clawmate_foundation::{ClawmateConfig, Error, Result};
use clawmate_provider::OllamaClient;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Interval between registry polls while joining a task
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum concurrently running task bodies
    pub max_concurrent: usize,

    /// Timeout applied when a task does not carry one
    pub default_task_timeout: Duration,

    /// Whether sandboxed tasks may use the container backend
    pub use_containers: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            default_task_timeout: Duration::from_secs(600),
            use_containers: true,
        }
    }
}

impl From<&ClawmateConfig> for OrchestratorConfig {
    fn from(config: &ClawmateConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_agents,
            default_task_timeout: Duration::from_secs(config.agent_timeout),
            use_containers: config.use_containers,
        }
    }
}

/// Point-in-time view of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Handles not yet terminal (idle or running)
    pub active: usize,
    /// Handles that completed successfully
    pub completed_ok: usize,
    /// Handles that failed or were cancelled
    pub completed_failed: usize,
    /// All handles ever registered and not yet cleaned up
    pub total: usize,
}

/// Registry record for one submitted task
struct AgentHandle {
    /// Current lifecycle state; only moves forward
    state: AgentState,

    /// In-flight body; taken by cancel/shutdown to drive convergence
    join: Option<JoinHandle<()>>,

    /// Set when a concurrency slot was granted
    dispatched_at: Option<Instant>,
}

/// Handle registry and result store behind one lock. A lifecycle
/// transition and its result write happen in a single non-suspending
/// critical section, so observers never see a handle mid-transition.
#[derive(Default)]
struct Registry {
    handles: HashMap<String, AgentHandle>,
    results: ResultStore,
}

impl Registry {
    /// Terminal transition; no-op when the handle is already terminal.
    fn finish(&mut self, task_id: &str, state: AgentState, result: AgentResult) {
        let Some(handle) = self.handles.get_mut(task_id) else {
            return;
        };
        if handle.state.is_terminal() {
            return;
        }
        handle.state = state;
        handle.join = None;
        self.results.record(result);
    }
}

/// Bounded-concurrency scheduler for agent tasks
#[derive(Clone)]
pub struct AgentOrchestrator {
    config: OrchestratorConfig,

    /// Handle registry + result store behind one lock
    registry: Arc<RwLock<Registry>>,

    /// Concurrency gate; caps running bodies, not registered tasks
    gate: Arc<Semaphore>,

    /// Execution backends by name; the shell backend doubles as fallback
    executors: Arc<ExecutorRegistry>,
    shell: Arc<ShellExecutor>,
    ollama: Arc<OllamaClient>,
}

impl AgentOrchestrator {
    /// Create an orchestrator with explicit collaborators
    pub fn new(
        config: OrchestratorConfig,
        shell: Arc<ShellExecutor>,
        container: Arc<ContainerExecutor>,
        ollama: Arc<OllamaClient>,
    ) -> Self {
        let mut executors = ExecutorRegistry::new();
        executors.register(shell.clone());
        executors.register(container);

        Self {
            gate: Arc::new(Semaphore::new(config.max_concurrent)),
            registry: Arc::new(RwLock::new(Registry::default())),
            config,
            executors: Arc::new(executors),
            shell,
            ollama,
        }
    }

    /// Build the orchestrator and its collaborators from configuration
    pub async fn from_config(config: &ClawmateConfig) -> Self {
        let shell = Arc::new(ShellExecutor::with_config(ShellExecutorConfig {
            default_timeout: Duration::from_secs(config.exec_timeout),
        }));
        let container = Arc::new(
            ContainerExecutor::with_config(ContainerExecutorConfig {
                image: config.container_image.clone(),
                default_timeout: Duration::from_secs(config.docker_timeout),
            })
            .await,
        );
        let ollama = Arc::new(
            OllamaClient::new(config.ollama_host.clone(), config.ollama_model.clone())
                .with_timeout(Duration::from_secs(config.ollama_timeout)),
        );

        Self::new(OrchestratorConfig::from(config), shell, container, ollama)
    }

    /// Submit a task; returns immediately with the task id.
    ///
    /// The body starts executing once the concurrency gate grants a slot.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, task: AgentTask) -> Result<String> {
        let task_id = task.task_id.clone();

        let mut registry = self.registry.write();
        if registry.handles.contains_key(&task_id) {
            return Err(Error::InvalidInput(format!(
                "Task id {} already submitted",
                task_id
            )));
        }

        // The body cannot transition until this lock is released, so the
        // handle is fully registered before it makes progress.
        let join = tokio::spawn(self.clone().run_body(task));
        registry.handles.insert(
            task_id.clone(),
            AgentHandle {
                state: AgentState::Idle,
                join: Some(join),
                dispatched_at: None,
            },
        );

        debug!("Submitted task {}", task_id);
        Ok(task_id)
    }

    /// The task body spawned per submission
    async fn run_body(self, task: AgentTask) {
        let task_id = task.task_id.clone();

        // The body counts as running only once a slot is granted
        let permit = match self.gate.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let dispatched = Instant::now();
        {
            let mut registry = self.registry.write();
            match registry.handles.get_mut(&task_id) {
                Some(handle) if !handle.state.is_terminal() => {
                    handle.state = AgentState::Running;
                    handle.dispatched_at = Some(dispatched);
                }
                // Cancelled or cleaned up before dispatch
                _ => return,
            }
        }

        debug!("Dispatched task {}", task_id);
        let outcome = self.execute_payload(&task).await;
        let elapsed = dispatched.elapsed();

        {
            let mut registry = self.registry.write();
            match outcome {
                Ok(output) => {
                    registry.finish(
                        &task_id,
                        AgentState::Completed,
                        AgentResult::ok(task_id.clone(), output, elapsed),
                    );
                    debug!("Task {} completed in {:.2}s", task_id, elapsed.as_secs_f64());
                }
                Err(Error::Cancelled) => {
                    registry.finish(
                        &task_id,
                        AgentState::Cancelled,
                        AgentResult::cancelled(task_id.clone(), elapsed),
                    );
                }
                Err(e) => {
                    warn!("Task {} failed: {}", task_id, e);
                    registry.finish(
                        &task_id,
                        AgentState::Failed,
                        AgentResult::failed(task_id.clone(), e.to_string(), elapsed),
                    );
                }
            }
        }

        // Release the slot only after the terminal transition is visible
        drop(permit);
    }

    /// Execute the task payload, converting every failure into an error
    /// that the body folds into a terminal result.
    async fn execute_payload(&self, task: &AgentTask) -> Result<String> {
        let timeout = task.timeout().unwrap_or(self.config.default_task_timeout);

        match &task.payload {
            TaskPayload::Command { command, args } => {
                let request = ExecutionRequest::new(command.clone())
                    .with_args(args.clone())
                    .with_timeout(timeout)
                    .with_elevated(task.elevated)
                    .with_sandbox(task.sandbox);

                let executor = self.select_executor(task);
                let result = executor.execute(&request).await;
                if result.is_success() {
                    Ok(result.stdout)
                } else {
                    Err(Error::Execution(execution_message(&result)))
                }
            }
            TaskPayload::Prompt { prompt } => {
                let model = task.model.as_deref();
                match tokio::time::timeout(timeout, self.ollama.generate(prompt, model)).await {
                    Ok(Ok(output)) => Ok(output),
                    Ok(Err(e)) => Err(e.into()),
                    Err(_) => Err(Error::Timeout(format!(
                        "Model call timed out after {} seconds",
                        timeout.as_secs()
                    ))),
                }
            }
        }
    }

    /// Route to the sandbox backend when requested and available
    fn select_executor(&self, task: &AgentTask) -> Arc<dyn Executor> {
        if task.sandbox && self.config.use_containers {
            if let Some(container) = self.executors.get_available("container") {
                return container;
            }
            warn!(
                "Container backend unavailable, falling back to shell for task {}",
                task.task_id
            );
        }
        self.shell.clone()
    }

    /// Wait for a task to reach its terminal result.
    ///
    /// Referencing an id that was never submitted is a contract violation
    /// and reported as [`Error::NotFound`].
    pub async fn wait(&self, task_id: &str) -> Result<AgentResult> {
        loop {
            {
                let registry = self.registry.read();
                if let Some(result) = registry.results.get(task_id) {
                    return Ok(result.clone());
                }
                if !registry.handles.contains_key(task_id) {
                    return Err(Error::NotFound(format!(
                        "Task {} was never submitted",
                        task_id
                    )));
                }
            }
            tokio::time::sleep(JOIN_POLL_INTERVAL).await;
        }
    }

    /// Submit every task, then await them in submission order.
    ///
    /// Results come back in submission order regardless of completion
    /// order; one task failing never affects its siblings.
    pub async fn run_swarm(&self, tasks: Vec<AgentTask>) -> Result<Vec<AgentResult>> {
        info!("Starting swarm with {} tasks", tasks.len());

        let mut task_ids = Vec::with_capacity(tasks.len());
        for task in tasks {
            task_ids.push(self.submit(task)?);
        }

        let mut results = Vec::with_capacity(task_ids.len());
        for task_id in &task_ids {
            results.push(self.wait(task_id).await?);
        }

        info!("Swarm completed with {} results", results.len());
        Ok(results)
    }

    /// Point-in-time snapshot, taken under one registry lock so no handle
    /// is ever observed mid-transition.
    pub fn status(&self) -> AgentStats {
        let registry = self.registry.read();
        let mut stats = AgentStats {
            active: 0,
            completed_ok: 0,
            completed_failed: 0,
            total: 0,
        };

        for handle in registry.handles.values() {
            stats.total += 1;
            match handle.state {
                AgentState::Completed => stats.completed_ok += 1,
                AgentState::Failed | AgentState::Cancelled => stats.completed_failed += 1,
                AgentState::Idle | AgentState::Running => stats.active += 1,
            }
        }

        stats
    }

    /// Number of handles currently in the running state
    pub fn running_count(&self) -> usize {
        self.registry
            .read()
            .handles
            .values()
            .filter(|h| h.state.is_running())
            .count()
    }

    /// Current lifecycle state of a task, if registered
    pub fn state_of(&self, task_id: &str) -> Option<AgentState> {
        self.registry.read().handles.get(task_id).map(|h| h.state)
    }

    /// Terminal result of a task, if it has reached one
    pub fn result_of(&self, task_id: &str) -> Option<AgentResult> {
        self.registry.read().results.get(task_id).cloned()
    }

    /// Cancel one task and wait until it has actually converged.
    ///
    /// The abort lands at the body's next suspension point; a spawned
    /// process is reaped by its kill-on-drop guard when the in-flight
    /// execute future is dropped. Awaiting the handle is what guarantees
    /// convergence before the task is marked cancelled.
    pub async fn cancel(&self, task_id: &str) -> Result<()> {
        let (join, dispatched_at) = {
            let mut registry = self.registry.write();
            let Some(handle) = registry.handles.get_mut(task_id) else {
                return Err(Error::NotFound(format!(
                    "Task {} was never submitted",
                    task_id
                )));
            };
            if handle.state.is_terminal() {
                return Ok(());
            }
            (handle.join.take(), handle.dispatched_at)
        };

        if let Some(join) = join {
            join.abort();
            let _ = join.await;
        }

        let elapsed = dispatched_at.map(|t| t.elapsed()).unwrap_or_default();
        self.registry.write().finish(
            task_id,
            AgentState::Cancelled,
            AgentResult::cancelled(task_id, elapsed),
        );

        info!("Cancelled task {}", task_id);
        Ok(())
    }

    /// Cancel all outstanding work, wait for convergence, then clear the
    /// handle and result registries. Idempotent: a second call finds
    /// nothing outstanding and performs no work.
    pub async fn shutdown(&self) {
        let pending: Vec<String> = {
            let registry = self.registry.read();
            registry
                .handles
                .iter()
                .filter(|(_, h)| !h.state.is_terminal())
                .map(|(id, _)| id.clone())
                .collect()
        };

        if !pending.is_empty() {
            info!("Shutting down with {} tasks outstanding", pending.len());
        }

        for task_id in &pending {
            let _ = self.cancel(task_id).await;
        }

        let mut registry = self.registry.write();
        registry.handles.clear();
        registry.results.clear();
    }
}

/// Human-readable message for a failed execution result
fn execution_message(result: &ExecutionResult) -> String {
    let detail = result.stderr.trim();
    if result.exit_code == -1 {
        if detail.is_empty() {
            "Execution did not complete".to_string()
        } else {
            detail.to_string()
        }
    } else if detail.is_empty() {
        format!("Command exited with code {}", result.exit_code)
    } else {
        format!("Command exited with code {}: {}", result.exit_code, detail)
    }
}
