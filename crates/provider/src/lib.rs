//! # clawmate-provider
//!
//! HTTP client for the Ollama model server. The orchestrator treats a
//! chat call as one more awaitable unit of work; failures here surface as
//! ordinary task failures, never as faults.

pub mod error;
pub mod message;
pub mod ollama;

pub use error::ProviderError;
pub use message::{Message, MessageRole};
pub use ollama::{ChatResponse, ModelEntry, OllamaClient};
