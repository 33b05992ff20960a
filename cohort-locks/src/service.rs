//! The process-wide lock table.

use crate::clock::{Clock, SystemClock};
use crate::lock::{compute_deadline, is_expired, EntityLock, LockId, LockKind};
use crate::LockError;
use cohort_types::EntityIdentifier;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Configuration for the lock service.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Lease duration applied when an operation does not specify one (ms).
    pub default_duration_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 300_000,
        }
    }
}

/// One row in the lock table. The `EntityLock` handles given to callers are
/// snapshots pointing at these rows by id.
#[derive(Debug, Clone)]
struct LockRow {
    id: LockId,
    owner: String,
    kind: LockKind,
    expires_at_ms: u64,
}

/// Grants and tracks leases over entity identifiers.
///
/// A single table-wide mutex serializes conflict checks with state
/// transitions, which keeps acquire/convert atomic. Expired rows are pruned
/// lazily whenever their subject is touched; there is no background sweeper.
pub struct LockService {
    config: LockConfig,
    clock: Arc<dyn Clock>,
    table: Mutex<HashMap<EntityIdentifier, Vec<LockRow>>>,
}

impl LockService {
    /// Creates a lock service on the system clock.
    #[must_use]
    pub fn new(config: LockConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a lock service on an explicit clock.
    #[must_use]
    pub fn with_clock(config: LockConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// The configured default lease duration in milliseconds.
    #[must_use]
    pub fn default_duration_ms(&self) -> u64 {
        self.config.default_duration_ms
    }

    /// Attempts to take a lock of `kind` on `subject` for `owner`.
    ///
    /// Succeeds immediately if no conflicting valid lock is held; fails with
    /// [`LockError::Conflict`] otherwise. Conflicts are never waited out or
    /// retried here.
    pub fn acquire(
        &self,
        subject: &EntityIdentifier,
        owner: &str,
        kind: LockKind,
        duration_ms: Option<u64>,
    ) -> Result<EntityLock, LockError> {
        let now = self.clock.now_ms();
        let ttl = duration_ms.unwrap_or(self.config.default_duration_ms);
        let mut table = self.table.lock().expect("lock table poisoned");

        let rows = table.entry(subject.clone()).or_default();
        rows.retain(|row| !is_expired(row.expires_at_ms, now));

        if let Some(held) = rows.iter().find(|row| kind.conflicts_with(row.kind)) {
            debug!(subject = %subject, owner, %kind, held_by = %held.owner, "lock denied");
            return Err(LockError::Conflict {
                subject: subject.to_string(),
                owner: held.owner.clone(),
                kind: held.kind,
            });
        }

        let lock = EntityLock::new(
            subject.clone(),
            owner.to_owned(),
            kind,
            compute_deadline(now, ttl),
        );
        rows.push(LockRow {
            id: lock.id(),
            owner: owner.to_owned(),
            kind,
            expires_at_ms: lock.expires_at_ms(),
        });
        debug!(subject = %subject, owner, %kind, expires_at_ms = lock.expires_at_ms(), "lock granted");
        Ok(lock)
    }

    /// Atomically changes the kind of a held lock, renewing its lease.
    ///
    /// The new kind is checked against every *other* current holder of the
    /// subject; the lock being converted does not conflict with itself.
    pub fn convert(
        &self,
        lock: &mut EntityLock,
        new_kind: LockKind,
        new_duration_ms: Option<u64>,
    ) -> Result<(), LockError> {
        let now = self.clock.now_ms();
        if is_expired(lock.expires_at_ms(), now) {
            return Err(LockError::Expired);
        }
        let ttl = new_duration_ms.unwrap_or(self.config.default_duration_ms);
        let mut table = self.table.lock().expect("lock table poisoned");

        let rows = table
            .get_mut(lock.subject())
            .ok_or(LockError::AlreadyReleased)?;
        rows.retain(|row| !is_expired(row.expires_at_ms, now));
        if !rows.iter().any(|row| row.id == lock.id()) {
            return Err(LockError::AlreadyReleased);
        }

        if let Some(held) = rows
            .iter()
            .find(|row| row.id != lock.id() && new_kind.conflicts_with(row.kind))
        {
            return Err(LockError::Conflict {
                subject: lock.subject().to_string(),
                owner: held.owner.clone(),
                kind: held.kind,
            });
        }

        let deadline = compute_deadline(now, ttl);
        for row in rows.iter_mut() {
            if row.id == lock.id() {
                row.kind = new_kind;
                row.expires_at_ms = deadline;
            }
        }
        debug!(subject = %lock.subject(), owner = lock.owner(), %new_kind, "lock converted");
        lock.set_kind(new_kind);
        lock.set_expires_at_ms(deadline);
        Ok(())
    }

    /// Extends a still-valid lease by `duration_ms` (or the service default).
    ///
    /// Renewal never resurrects: an expired lock fails with
    /// [`LockError::Expired`].
    pub fn renew(
        &self,
        lock: &mut EntityLock,
        duration_ms: Option<u64>,
    ) -> Result<(), LockError> {
        let now = self.clock.now_ms();
        if is_expired(lock.expires_at_ms(), now) {
            return Err(LockError::Expired);
        }
        let ttl = duration_ms.unwrap_or(self.config.default_duration_ms);
        let mut table = self.table.lock().expect("lock table poisoned");

        let rows = table
            .get_mut(lock.subject())
            .ok_or(LockError::AlreadyReleased)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == lock.id())
            .ok_or(LockError::AlreadyReleased)?;

        let deadline = compute_deadline(now, ttl);
        row.expires_at_ms = deadline;
        lock.set_expires_at_ms(deadline);
        Ok(())
    }

    /// Releases a lock. Further operations on the handle fail with
    /// [`LockError::AlreadyReleased`].
    pub fn release(&self, lock: &EntityLock) -> Result<(), LockError> {
        let mut table = self.table.lock().expect("lock table poisoned");
        let rows = table
            .get_mut(lock.subject())
            .ok_or(LockError::AlreadyReleased)?;
        let before = rows.len();
        rows.retain(|row| row.id != lock.id());
        if rows.len() == before {
            return Err(LockError::AlreadyReleased);
        }
        if rows.is_empty() {
            table.remove(lock.subject());
        }
        debug!(subject = %lock.subject(), owner = lock.owner(), "lock released");
        Ok(())
    }

    /// Returns true if the lock is still held and unexpired.
    pub fn is_valid(&self, lock: &EntityLock) -> bool {
        let now = self.clock.now_ms();
        if is_expired(lock.expires_at_ms(), now) {
            return false;
        }
        let table = self.table.lock().expect("lock table poisoned");
        table
            .get(lock.subject())
            .is_some_and(|rows| rows.iter().any(|row| row.id == lock.id()))
    }

    /// Number of valid locks currently held on `subject`.
    pub fn active_locks(&self, subject: &EntityIdentifier) -> usize {
        let now = self.clock.now_ms();
        let table = self.table.lock().expect("lock table poisoned");
        table
            .get(subject)
            .map(|rows| {
                rows.iter()
                    .filter(|row| !is_expired(row.expires_at_ms, now))
                    .count()
            })
            .unwrap_or(0)
    }
}
