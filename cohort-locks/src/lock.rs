//! Lock values and the pure expiry/conflict math.

use cohort_types::EntityIdentifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a granted lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockId(Uuid);

impl LockId {
    pub(crate) fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The degree of exclusivity a lock grants.
///
/// A read lock guarantees repeatable reads; other clients can take read
/// locks but not write locks. A write lock guarantees exclusive access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    Read,
    Write,
}

impl LockKind {
    /// Returns true if a lock of `self` cannot coexist with one of `other`
    /// on the same subject.
    #[must_use]
    pub const fn conflicts_with(self, other: Self) -> bool {
        matches!(self, Self::Write) || matches!(other, Self::Write)
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// A granted lease: a claim of `kind` exclusivity over `subject` held by
/// `owner` until `expires_at_ms`.
///
/// This is a handle into the lock table; all state transitions go through
/// [`crate::LockService`], which updates the handle in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLock {
    id: LockId,
    subject: EntityIdentifier,
    owner: String,
    kind: LockKind,
    expires_at_ms: u64,
}

impl EntityLock {
    pub(crate) fn new(
        subject: EntityIdentifier,
        owner: String,
        kind: LockKind,
        expires_at_ms: u64,
    ) -> Self {
        Self {
            id: LockId::new(),
            subject,
            owner,
            kind,
            expires_at_ms,
        }
    }

    /// The lease's unique id.
    #[must_use]
    pub const fn id(&self) -> LockId {
        self.id
    }

    /// The locked entity.
    #[must_use]
    pub const fn subject(&self) -> &EntityIdentifier {
        &self.subject
    }

    /// The holder of the lock (a user, the framework, ...).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The lock kind.
    #[must_use]
    pub const fn kind(&self) -> LockKind {
        self.kind
    }

    /// Expiration time in Unix milliseconds.
    #[must_use]
    pub const fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    pub(crate) fn set_kind(&mut self, kind: LockKind) {
        self.kind = kind;
    }

    pub(crate) fn set_expires_at_ms(&mut self, expires_at_ms: u64) {
        self.expires_at_ms = expires_at_ms;
    }
}

/// Computes a lease deadline, saturating on overflow.
#[inline]
#[must_use]
pub(crate) fn compute_deadline(now_ms: u64, ttl_ms: u64) -> u64 {
    now_ms.saturating_add(ttl_ms)
}

/// A lease is valid strictly before its deadline and invalid at or after it.
#[inline]
#[must_use]
pub(crate) fn is_expired(deadline_ms: u64, now_ms: u64) -> bool {
    now_ms >= deadline_ms
}
