//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Absent lookups are not errors: `find`-style operations return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing service could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The service marks this group (or itself) read-only.
    #[error("group `{0}` is not editable in this service")]
    NotEditable(String),

    /// A lock operation performed on the store's behalf failed.
    #[error(transparent)]
    Lock(#[from] cohort_locks::LockError),

    /// Malformed key encountered while resolving store data.
    #[error(transparent)]
    Key(#[from] cohort_types::KeyError),

    /// Any other backend failure, surfaced unchanged.
    #[error("backend error: {0}")]
    Backend(String),
}
