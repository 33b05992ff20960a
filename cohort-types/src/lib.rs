//! Core type definitions for Cohort.
//!
//! This crate defines the fundamental, store-agnostic types used throughout
//! the directory core:
//! - Entity identifiers and the closed `TypeTag` describing entity kinds
//! - Composite keys addressing entities across a federation of services
//! - Name-search methods and queries
//!
//! Everything here is a plain value type. Resolving a service-path segment to
//! an actual backing service belongs to the federation layer, not here.

mod composite;
mod ids;
mod search;

pub use composite::{
    parse_local_key, CompositeEntityIdentifier, KeyError, ServiceName, DELIMITER, ESCAPE,
};
pub use ids::{EntityIdentifier, TypeTag};
pub use search::{SearchMethod, SearchQuery};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, KeyError>;
