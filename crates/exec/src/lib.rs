//! # clawmate-exec
//!
//! Command execution backends for ClawMate. Translates execution requests
//! into host processes or disposable containers, with timeout control,
//! guaranteed cleanup, and line-granular output streaming.

pub mod executor;
pub mod registry;
pub mod request;

pub use executor::{
    build_command, ContainerExecutor, ContainerExecutorConfig, Executor, ShellExecutor,
    ShellExecutorConfig,
};
pub use registry::ExecutorRegistry;
pub use request::{ExecutionRequest, ExecutionResult, OutputChunk, StreamOrigin};
