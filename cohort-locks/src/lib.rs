//! Lease-based advisory locking for Cohort.
//!
//! Locks are time-bounded, owner-tagged claims over an entity identifier.
//! Any number of read locks on a subject coexist; a write lock excludes
//! everything else. A lock past its expiration is implicitly invalid and is
//! treated as absent by conflict checks (lazy expiry, no background sweeper).
//!
//! Locks are advisory: nothing in the directory core acquires them
//! automatically. A caller wanting exclusive access acquires a write lock,
//! performs its edits and commit, then releases.

mod clock;
mod lock;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lock::{EntityLock, LockId, LockKind};
pub use service::{LockConfig, LockService};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors that can occur in lock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// An incompatible lock is already held on the subject.
    #[error("lock conflict on `{subject}`: {kind} lock held by `{owner}`")]
    Conflict {
        subject: String,
        owner: String,
        kind: LockKind,
    },

    /// The lock has passed its expiration time.
    #[error("lock has expired")]
    Expired,

    /// The lock was already released.
    #[error("lock was already released")]
    AlreadyReleased,
}
