//! Error types for portal-dl
//!
//! Errors are local to the action that triggered them: a failed fetch aborts
//! only that fetch, a failed transfer marks only its own task. Nothing in this
//! module crosses task boundaries.

use thiserror::Error;

/// Result type alias for portal-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for portal-dl
#[derive(Debug, Error)]
pub enum Error {
    /// A backend command invocation (fetch or transfer issue) failed.
    ///
    /// Surfaced to the consumer as a transient message; the triggering action
    /// is aborted and prior state is left unchanged.
    #[error("backend invocation failed: {0}")]
    Backend(String),

    /// An in-flight transfer reported a failure.
    ///
    /// The corresponding task is marked failed with its progress frozen.
    /// There is no automatic retry; a new transfer must be explicitly
    /// reissued.
    #[error("transfer failed for task {key}: {reason}")]
    Transfer {
        /// Task key of the failed transfer
        key: String,
        /// Failure reason reported by the backend boundary
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "save_path")
        key: Option<String>,
    },

    /// I/O error (configuration file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
