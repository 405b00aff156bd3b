//! Error types for mcq-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Caller-contract violations. Malformed pasted text is never an error;
/// the parser reports it as `InvalidFragment` data instead.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("section counts cover {expected} records but {actual} were supplied")]
    SectionCountMismatch { expected: usize, actual: usize },

    #[error("record {id} does not have four resolvable options")]
    UnresolvableOptions { id: String },
}
