//! Error taxonomy shared by the lexical index, the predicate compiler and the
//! retrieval controller.
//!
//! An empty result is not an error: it is reported through
//! [`RetrievalOutcome::InsufficientEvidence`](crate::search::RetrievalOutcome).

use std::time::Duration;

/// Flat classification of [`RetrievalError`] for callers deciding on retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Vector store or model endpoint unreachable or timed out.
    BackendUnavailable,
    /// Lexical search attempted before a snapshot was built or loaded.
    IndexNotLoaded,
    /// Malformed filter specification, rejected before any I/O.
    InvalidFilterSpec,
    /// Request aborted by its cancellation signal.
    Cancelled,
    /// Snapshot persistence failure (I/O, corruption, invariant violation).
    Snapshot,
    /// Invalid configuration or backend response shape.
    InvalidConfig,
}

impl ErrorKind {
    /// Snake-case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::IndexNotLoaded => "index_not_loaded",
            ErrorKind::InvalidFilterSpec => "invalid_filter_spec",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Snapshot => "snapshot",
            ErrorKind::InvalidConfig => "invalid_config",
        }
    }
}

/// Errors surfaced by the retrieval core.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("{backend} unavailable: {reason}")]
    BackendUnavailable { backend: &'static str, reason: String },

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("lexical index not loaded")]
    IndexNotLoaded,

    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimension { expected: usize, actual: usize },

    #[error("request cancelled")]
    Cancelled,

    #[error("snapshot error: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RetrievalError {
    /// Shorthand for a backend failure.
    pub fn backend(backend: &'static str, reason: impl ToString) -> Self {
        RetrievalError::BackendUnavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    /// Classifies the error. Timeouts and dimension mismatches count as the
    /// backend being unavailable.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::BackendUnavailable { .. }
            | RetrievalError::Timeout { .. }
            | RetrievalError::EmbeddingDimension { .. } => ErrorKind::BackendUnavailable,
            RetrievalError::IndexNotLoaded => ErrorKind::IndexNotLoaded,
            RetrievalError::InvalidFilterSpec(_) => ErrorKind::InvalidFilterSpec,
            RetrievalError::Cancelled => ErrorKind::Cancelled,
            RetrievalError::Snapshot(_) => ErrorKind::Snapshot,
            RetrievalError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_backend_unavailable() {
        let err = RetrievalError::Timeout {
            stage: "dense_search",
            after: Duration::from_millis(50),
        };
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert_eq!(err.kind().as_str(), "backend_unavailable");
        assert!(err.to_string().contains("dense_search"));
    }

    #[test]
    fn test_io_error_maps_to_snapshot() {
        let err: RetrievalError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Snapshot);
    }
}
