//! Execution backends
//!
//! Provides two backends behind a common trait:
//! - `ShellExecutor` - host process execution with output streaming
//! - `ContainerExecutor` - Docker-isolated execution for sandboxed tasks

pub mod command;
pub mod container;
pub mod shell;
pub mod r#trait;

pub use command::build_command;
pub use container::{ContainerExecutor, ContainerExecutorConfig};
pub use r#trait::Executor;
pub use shell::{ShellExecutor, ShellExecutorConfig};
