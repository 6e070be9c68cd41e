//! Error types for ClawMate
//!
//! All errors are managed centrally. The execution and agent layers fold
//! most of these into result shapes at their boundaries, so only contract
//! violations ever reach a caller as an `Err`.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ClawMate error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process could not be started (missing binary, permissions, bad
    /// working directory)
    #[error("Spawn failed: {0}")]
    Spawn(String),

    /// Wall-clock budget exceeded; the underlying process has already been
    /// terminated when this is produced
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Process or sandbox ran and reported failure
    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Cancelled")]
    Cancelled,

    /// Model-call collaborator failure
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check whether retrying the operation could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::Http(_) | Error::Provider(_)
        )
    }

    /// Check whether the error marks a terminal task outcome rather than a
    /// caller mistake
    pub fn is_task_outcome(&self) -> bool {
        matches!(
            self,
            Error::Spawn(_)
                | Error::Timeout(_)
                | Error::Execution(_)
                | Error::Cancelled
                | Error::Provider(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::Timeout("after 5 seconds".to_string());
        assert_eq!(err.to_string(), "Timed out: after 5 seconds");

        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Cancelled");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout("t".into()).is_retryable());
        assert!(Error::Http("503".into()).is_retryable());
        assert!(!Error::Spawn("missing".into()).is_retryable());
        assert!(!Error::NotFound("task".into()).is_retryable());
    }

    #[test]
    fn test_task_outcome_classification() {
        assert!(Error::Execution("exit 1".into()).is_task_outcome());
        assert!(Error::Cancelled.is_task_outcome());
        assert!(!Error::InvalidInput("dup".into()).is_task_outcome());
    }
}
