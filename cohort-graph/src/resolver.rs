//! The seam between the in-memory graph and the backing stores.

use crate::GraphResult;
use cohort_model::EntityGroup;
use cohort_store::GroupStore;
use cohort_types::{CompositeEntityIdentifier, EntityIdentifier, ServiceName};
use std::sync::Arc;

/// Resolves graph edges that are not held in memory.
///
/// Deep traversals ask a resolver for two things: the full group behind a
/// member reference (descending), and the groups that contain a member
/// (ascending). Containing groups are always derived by querying membership
/// rows; the graph never stores parent back-pointers.
///
/// The federation aggregator implements this over the whole service tree;
/// [`StoreResolver`] implements it over a single store.
pub trait GroupResolver: Send + Sync {
    /// Loads the group with the given composite identifier, or `None` if no
    /// service stores it.
    fn resolve_group(&self, id: &CompositeEntityIdentifier)
        -> GraphResult<Option<EntityGroup>>;

    /// Returns the groups that directly contain `member`.
    fn containing_groups(&self, member: &EntityIdentifier) -> GraphResult<Vec<EntityGroup>>;
}

/// A resolver over a single backing store.
pub struct StoreResolver {
    service_name: ServiceName,
    store: Arc<dyn GroupStore>,
}

impl StoreResolver {
    /// Creates a resolver for a store backing `service_name`.
    pub fn new(service_name: ServiceName, store: Arc<dyn GroupStore>) -> Self {
        Self {
            service_name,
            store,
        }
    }
}

impl GroupResolver for StoreResolver {
    fn resolve_group(
        &self,
        id: &CompositeEntityIdentifier,
    ) -> GraphResult<Option<EntityGroup>> {
        // A key addressed to a different service cannot resolve here.
        if id.service_name() != &self.service_name {
            return Ok(None);
        }
        Ok(self.store.find(id.local_key())?)
    }

    fn containing_groups(&self, member: &EntityIdentifier) -> GraphResult<Vec<EntityGroup>> {
        Ok(self.store.find_containing_groups(member)?)
    }
}
