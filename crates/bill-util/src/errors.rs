use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for bill operations that cross crate seams.
///
/// The resolver and scheduler carry their own structured error types;
/// this enum covers the collaborator boundaries (phase bodies, I/O)
/// where only a message survives.
#[derive(Debug, Error, Diagnostic)]
pub enum BillError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dependency resolution failed.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// A build phase body (compile, test, package) reported failure.
    #[error("Phase failed: {message}")]
    Phase { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type BillResult<T> = miette::Result<T>;
