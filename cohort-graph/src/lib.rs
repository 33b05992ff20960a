//! Membership graph algebra for Cohort.
//!
//! Answers containment and membership queries over the group/entity graph
//! without materializing the whole universe and without looping on cycles.
//! Direct membership lives in each group's in-memory member set; everything
//! deeper is computed lazily through a [`GroupResolver`], which loads
//! additional subtrees from the backing stores on demand.
//!
//! Cycles should never be created going forward (`add_member` rejects them),
//! but a backing store may already contain one; every deep traversal here
//! carries a visited set and terminates regardless.

mod membership;
mod resolver;
mod traversal;

pub use membership::GroupGraph;
pub use resolver::{GroupResolver, StoreResolver};
pub use traversal::{ContainingGroups, DeepMembers};

/// Result type alias using the crate's error type.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Errors that can occur in graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Adding the member would make a group contain itself, directly or
    /// transitively.
    #[error("adding `{member}` to `{group}` would create a circular reference")]
    CircularReference { group: String, member: String },

    /// A direct member group with the same name already exists.
    #[error("group already has a member group named `{0}`")]
    DuplicateName(String),

    /// A store call made during traversal failed.
    #[error(transparent)]
    Store(#[from] cohort_store::StoreError),
}
