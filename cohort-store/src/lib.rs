//! Backing store layer for Cohort.
//!
//! Each federated service implements the [`GroupStore`] contract: find,
//! create, delete and update groups, list memberships, and search by name.
//! The directory core never talks to a persistence engine directly; it only
//! sees this trait. Store calls are the sole blocking operations in the
//! system (§ concurrency model) and their transaction semantics are the
//! store's own.
//!
//! [`MemoryStore`] is the in-process reference implementation, used by tests
//! and as a locally managed leaf service.

mod adapter;
mod error;
mod memory;

pub use adapter::GroupStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
