//! Error types for the cacerts-packages crate.

use thiserror::Error;

/// Failures running an external package tool. A tool that runs and exits
/// nonzero is not an error at this level; see [`crate::CommandOutput`].
#[derive(Debug, Error)]
pub enum PackageError {
    /// The tool binary could not be started.
    #[error("failed to execute {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// Underlying I/O failure while collecting output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool exceeded the configured time budget and was killed.
    #[error("{program} timed out after {ms}ms")]
    Timeout { program: String, ms: u64 },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PackageError>;
