//! Group and entity model types for Cohort.
//!
//! A directory is made of composite nodes (groups) and leaf nodes (entities)
//! connected by direct-membership edges. This crate holds the in-memory
//! representation of those nodes; the containment algebra that walks them
//! lives in `cohort-graph`, and durability lives behind the store adapter in
//! `cohort-store`.
//!
//! Mutations here change memory only. Nothing is durable until a caller
//! commits the group through its owning store.

mod group;
mod member;

pub use group::EntityGroup;
pub use member::{Entity, GroupMember};
