//! # clawmate-foundation
//!
//! Foundation layer for ClawMate:
//! - Error: central error taxonomy and `Result` alias
//! - Config: runtime configuration with file and environment loading
//! - Logging: tracing bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ClawmateConfig, CONFIG_FILE};
pub use error::{Error, Result};
