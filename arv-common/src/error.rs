//! Common error types for assessment view materialization

use thiserror::Error;

/// Common result type for ARV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ARV crates
#[derive(Error, Debug)]
pub enum Error {
    /// A specifically requested single entity is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// An aggregate field was read before the fetch that owns it ran
    ///
    /// Always a coordinator bug: dependent fields are never defaulted.
    #[error("Precondition not initialized: {0}")]
    PreconditionNotInitialized(String),

    /// A required collaborator call failed
    #[error("Collaborator unavailable ({collaborator}): {message}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        message: String,
    },

    /// A schedule references content that cannot be resolved
    #[error("Inconsistent reference: {0}")]
    InconsistentReference(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a collaborator failure, keeping the full context chain
    pub fn collaborator(collaborator: &'static str, err: anyhow::Error) -> Self {
        Error::CollaboratorUnavailable {
            collaborator,
            message: format!("{:#}", err),
        }
    }

    /// True for errors that identify a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_keeps_context() {
        let err = anyhow::anyhow!("connection refused").context("schedule lookup");
        let wrapped = Error::collaborator("schedule_store", err);

        let text = wrapped.to_string();
        assert!(text.contains("schedule_store"));
        assert!(text.contains("schedule lookup"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_not_found_predicate() {
        assert!(Error::NotFound("schedule s1".into()).is_not_found());
        assert!(!Error::Internal("boom".into()).is_not_found());
    }
}
