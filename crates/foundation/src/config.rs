//! Runtime configuration
//!
//! Defaults are baked in; `~/.clawmate/config.json` overrides them when
//! present, and `CLAWMATE_*` environment variables override the file.
//! The config is constructed once at startup and passed down explicitly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Prefix for environment overrides
const ENV_PREFIX: &str = "CLAWMATE_";

/// ClawMate runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClawmateConfig {
    /// Ollama API base URL
    pub ollama_host: String,

    /// Default model for prompt tasks
    pub ollama_model: String,

    /// Model call timeout in seconds
    pub ollama_timeout: u64,

    /// Maximum concurrently running agent bodies
    pub max_concurrent_agents: usize,

    /// Default agent task timeout in seconds
    pub agent_timeout: u64,

    /// Default shell execution timeout in seconds
    pub exec_timeout: u64,

    /// Whether sandboxed tasks may run in containers
    pub use_containers: bool,

    /// Container wait timeout in seconds
    pub docker_timeout: u64,

    /// Base image for sandboxed runs
    pub container_image: String,

    /// Data directory holding the config file
    pub data_dir: PathBuf,
}

impl Default for ClawmateConfig {
    fn default() -> Self {
        Self {
            ollama_host: "http://127.0.0.1:11434".to_string(),
            ollama_model: "qwen3-coder:latest".to_string(),
            ollama_timeout: 300,
            max_concurrent_agents: 4,
            agent_timeout: 600,
            exec_timeout: 300,
            use_containers: true,
            docker_timeout: 300,
            container_image: "ubuntu:22.04".to_string(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clawmate")
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, key))
        .ok()
        .filter(|v| !v.is_empty())
}

impl ClawmateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration: defaults, then the config file if present, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let path = config.data_dir.join(CONFIG_FILE);
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            config = serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            debug!("Loaded configuration from {}", path.display());
        }

        config.apply_env();
        Ok(config)
    }

    /// Apply `CLAWMATE_*` environment overrides in place
    pub fn apply_env(&mut self) {
        if let Some(v) = env_override("OLLAMA_HOST") {
            self.ollama_host = v;
        }
        if let Some(v) = env_override("OLLAMA_MODEL") {
            self.ollama_model = v;
        }
        if let Some(v) = env_override("OLLAMA_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.ollama_timeout = v;
        }
        if let Some(v) = env_override("MAX_CONCURRENT_AGENTS").and_then(|v| v.parse().ok()) {
            self.max_concurrent_agents = v;
        }
        if let Some(v) = env_override("AGENT_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.agent_timeout = v;
        }
        if let Some(v) = env_override("EXEC_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.exec_timeout = v;
        }
        if let Some(v) = env_override("USE_CONTAINERS").and_then(|v| v.parse().ok()) {
            self.use_containers = v;
        }
        if let Some(v) = env_override("DOCKER_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.docker_timeout = v;
        }
        if let Some(v) = env_override("CONTAINER_IMAGE") {
            self.container_image = v;
        }
        if let Some(v) = env_override("DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClawmateConfig::default();
        assert_eq!(config.max_concurrent_agents, 4);
        assert_eq!(config.agent_timeout, 600);
        assert!(config.use_containers);
        assert!(config.data_dir.ends_with(".clawmate"));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CLAWMATE_MAX_CONCURRENT_AGENTS", "8");
        std::env::set_var("CLAWMATE_USE_CONTAINERS", "false");
        std::env::set_var("CLAWMATE_OLLAMA_MODEL", "llama3.2");

        let mut config = ClawmateConfig::default();
        config.apply_env();

        assert_eq!(config.max_concurrent_agents, 8);
        assert!(!config.use_containers);
        assert_eq!(config.ollama_model, "llama3.2");

        std::env::remove_var("CLAWMATE_MAX_CONCURRENT_AGENTS");
        std::env::remove_var("CLAWMATE_USE_CONTAINERS");
        std::env::remove_var("CLAWMATE_OLLAMA_MODEL");
    }

    #[test]
    fn test_invalid_env_value_is_ignored() {
        std::env::set_var("CLAWMATE_AGENT_TIMEOUT", "not-a-number");

        let mut config = ClawmateConfig::default();
        config.apply_env();
        assert_eq!(config.agent_timeout, 600);

        std::env::remove_var("CLAWMATE_AGENT_TIMEOUT");
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ClawmateConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: ClawmateConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.ollama_host, config.ollama_host);
        assert_eq!(parsed.container_image, config.container_image);
    }
}
