//! # clawmate-agent
//!
//! Agent orchestration for ClawMate: bounded-concurrency scheduling of
//! shell, sandbox, and model-call tasks with lifecycle tracking, fan-out /
//! fan-in, and graceful shutdown.

pub mod orchestrator;
pub mod state;
pub mod store;
pub mod task;

pub use orchestrator::{AgentOrchestrator, AgentStats, OrchestratorConfig};
pub use state::AgentState;
pub use store::ResultStore;
pub use task::{AgentResult, AgentTask, TaskPayload};
