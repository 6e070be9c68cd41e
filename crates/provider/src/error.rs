//! Provider-specific error types
//!
//! `ProviderError` carries the detail the client layer cares about; the
//! orchestrator converts it into `clawmate_foundation::Error::Provider`
//! and treats it as an ordinary task failure.

use clawmate_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors from the model-call collaborator
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Connection failed, DNS, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Response did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not found or not loadable
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Streaming body ended abnormally
    #[error("Stream error: {0}")]
    StreamError(String),
}

impl ProviderError {
    /// Create from HTTP status code and body
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            404 => ProviderError::ModelNotAvailable(body.to_string()),
            500..=599 => ProviderError::ServerError(body.to_string()),
            _ => ProviderError::InvalidResponse(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        FoundationError::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert!(matches!(
            ProviderError::from_http_status(404, "missing"),
            ProviderError::ModelNotAvailable(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(503, "overloaded"),
            ProviderError::ServerError(_)
        ));
        assert!(matches!(
            ProviderError::from_http_status(400, "bad"),
            ProviderError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_foundation_conversion() {
        let err: FoundationError = ProviderError::Network("refused".to_string()).into();
        assert!(matches!(err, FoundationError::Provider(_)));
        assert!(err.to_string().contains("refused"));
    }
}
