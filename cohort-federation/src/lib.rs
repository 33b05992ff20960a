//! Federation layer: routes composite keys to the service that owns them,
//! fans searches out across every leaf service, and exposes the directory
//! facade applications call.
//!
//! A federation is a tree of [`ServiceNode`]s. Interior nodes (components)
//! group sub-services; leaves bind a service name to a
//! [`cohort_store::GroupStore`]. Operations never target a component
//! directly, they navigate through it to a leaf.

mod directory;
mod routing;
mod search;

pub use directory::{DirectoryConfig, FederatedDirectory};
pub use routing::ServiceNode;

use cohort_graph::GraphError;
use cohort_locks::LockError;
use cohort_store::StoreError;
use cohort_types::KeyError;
use thiserror::Error;

/// Errors surfaced by the directory facade.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A composite key's service path resolves to no registered service.
    #[error("unknown service '{0}'")]
    UnknownService(String),

    /// A service cannot be mounted at the requested path.
    #[error("cannot mount service at '{0}': {1}")]
    MountConflict(String, String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;
