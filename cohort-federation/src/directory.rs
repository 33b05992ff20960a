//! The directory facade.
//!
//! `FederatedDirectory` is what applications hold: one object that routes
//! every composite-key operation to the owning leaf service, answers
//! whole-federation searches, and spans the membership graph across
//! services by implementing [`GroupResolver`].

use crate::routing::ServiceNode;
use crate::search::{fan_out_entities, fan_out_groups, scope_to};
use crate::{DirectoryError, DirectoryResult};
use cohort_graph::{GraphResult, GroupGraph, GroupResolver};
use cohort_locks::EntityLock;
use cohort_model::{Entity, EntityGroup, GroupMember};
use cohort_store::{GroupStore, StoreError};
use cohort_types::{
    parse_local_key, CompositeEntityIdentifier, EntityIdentifier, SearchQuery, ServiceName,
    TypeTag,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for a federated directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Where `new_group` creates groups when no service is given.
    pub default_service: ServiceName,
    /// Well-known group names mapped to the composite key of the group
    /// serving that role.
    pub distinguished_groups: BTreeMap<String, String>,
}

/// The application-facing entry point to a federation of group services.
pub struct FederatedDirectory {
    config: DirectoryConfig,
    root: ServiceNode,
}

impl FederatedDirectory {
    pub fn new(config: DirectoryConfig, root: ServiceNode) -> Self {
        info!(
            services = root.leaf_services().len(),
            "federated directory assembled"
        );
        Self { config, root }
    }

    /// The routing tree.
    #[must_use]
    pub fn root(&self) -> &ServiceNode {
        &self.root
    }

    /// A membership graph spanning every mounted service.
    #[must_use]
    pub fn graph(&self) -> GroupGraph<'_> {
        GroupGraph::new(self)
    }

    // ── lookup ───────────────────────────────────────────────────

    /// Returns the group stored under the composite `key`, or `None`.
    pub fn find_group(&self, key: &str) -> DirectoryResult<Option<EntityGroup>> {
        let id = CompositeEntityIdentifier::parse(key, TypeTag::Group)?;
        let store = self.store_owning(id.service_name())?;
        Ok(store.find(id.local_key())?)
    }

    /// Returns the group under `key` together with a write lease held by
    /// `lock_owner`, or `None` if the group does not exist.
    pub fn find_lockable_group(
        &self,
        key: &str,
        lock_owner: &str,
    ) -> DirectoryResult<Option<(EntityGroup, EntityLock)>> {
        let id = CompositeEntityIdentifier::parse(key, TypeTag::Group)?;
        let store = self.store_owning(id.service_name())?;
        Ok(store.find_lockable(id.local_key(), lock_owner)?)
    }

    /// A leaf entity of the federation. Entities are not stored; the
    /// identifier is the entity.
    #[must_use]
    pub fn get_entity(&self, key: &str, tag: TypeTag) -> Entity {
        Entity::new(key, tag)
    }

    /// A leaf entity scoped to one service: its underlying key carries the
    /// service path.
    pub fn get_entity_in(
        &self,
        service: &ServiceName,
        key: &str,
        tag: TypeTag,
    ) -> DirectoryResult<Entity> {
        self.store_owning(service)?;
        let id = CompositeEntityIdentifier::new(service.clone(), key, tag)?;
        Ok(Entity::new(id.format(), tag))
    }

    /// Resolves a key and tag into something addable to a group: the stored
    /// group when `tag` is a group tag, otherwise the entity itself.
    pub fn get_group_member(
        &self,
        key: &str,
        tag: TypeTag,
    ) -> DirectoryResult<Option<GroupMember>> {
        if tag.is_group() {
            Ok(self.find_group(key)?.map(GroupMember::from))
        } else {
            Ok(Some(self.get_entity(key, tag).into()))
        }
    }

    /// [`Self::get_group_member`] addressed by identifier.
    pub fn get_group_member_for(
        &self,
        id: &EntityIdentifier,
    ) -> DirectoryResult<Option<GroupMember>> {
        self.get_group_member(id.key(), id.tag())
    }

    /// The group serving the well-known role `name`, or `None` when the
    /// role is unconfigured or its group is gone.
    pub fn get_distinguished_group(&self, name: &str) -> DirectoryResult<Option<EntityGroup>> {
        match self.distinguished_group_key(name) {
            Some(key) => self.find_group(key),
            None => Ok(None),
        }
    }

    /// The composite key configured for the well-known role `name`.
    #[must_use]
    pub fn distinguished_group_key(&self, name: &str) -> Option<&str> {
        self.config.distinguished_groups.get(name).map(String::as_str)
    }

    // ── creation and commit ──────────────────────────────────────

    /// A new, unsaved group in the configured default service.
    pub fn new_group(&self, leaf_type: TypeTag) -> DirectoryResult<EntityGroup> {
        self.new_group_in(&self.config.default_service, leaf_type)
    }

    /// A new, unsaved group with a reserved key in `service`.
    pub fn new_group_in(
        &self,
        service: &ServiceName,
        leaf_type: TypeTag,
    ) -> DirectoryResult<EntityGroup> {
        let store = self.store_owning(service)?;
        Ok(store.new_instance(leaf_type)?)
    }

    /// Commits the group's attributes and memberships to its owning service.
    pub fn update_group(&self, group: &EntityGroup) -> DirectoryResult<()> {
        let store = self.editable_store_for(group)?;
        store.update(group)?;
        debug!(key = %group.composite_identifier(), "group updated");
        Ok(())
    }

    /// Commits the group's memberships to its owning service.
    pub fn update_group_members(&self, group: &EntityGroup) -> DirectoryResult<()> {
        let store = self.editable_store_for(group)?;
        store.update_members(group)?;
        debug!(key = %group.composite_identifier(), "group memberships updated");
        Ok(())
    }

    /// Deletes the group from its owning service.
    pub fn delete_group(&self, group: &EntityGroup) -> DirectoryResult<()> {
        let store = self.editable_store_for(group)?;
        store.delete(group)?;
        info!(key = %group.composite_identifier(), "group deleted");
        Ok(())
    }

    // ── search ───────────────────────────────────────────────────

    /// Finds groups by name across the federation. With a scope ancestor
    /// set, only groups inside that ancestor's deep member closure are
    /// returned.
    pub fn search_for_groups(
        &self,
        query: &SearchQuery,
    ) -> DirectoryResult<Vec<EntityIdentifier>> {
        let found = fan_out_groups(&self.root, &query.pattern, query.method, query.leaf_type)?;
        self.apply_scope(found, query.scope_ancestor.as_ref())
    }

    /// Finds leaf entities by key across the federation. A search routine
    /// of its own, never answered by group search.
    pub fn search_for_entities(
        &self,
        query: &SearchQuery,
    ) -> DirectoryResult<Vec<EntityIdentifier>> {
        let found = fan_out_entities(&self.root, &query.pattern, query.method, query.leaf_type)?;
        self.apply_scope(found, query.scope_ancestor.as_ref())
    }

    // ── key helpers ──────────────────────────────────────────────

    /// The final node of a composite key.
    pub fn parse_local_key(&self, composite_key: &str) -> DirectoryResult<String> {
        Ok(parse_local_key(composite_key)?)
    }

    /// Parses a dotted service name.
    pub fn parse_service_name(&self, text: &str) -> DirectoryResult<ServiceName> {
        Ok(ServiceName::parse(text)?)
    }

    // ── internals ────────────────────────────────────────────────

    fn store_owning(&self, service: &ServiceName) -> DirectoryResult<&Arc<dyn GroupStore>> {
        self.root
            .store_for(service)
            .ok_or_else(|| DirectoryError::UnknownService(service.to_string()))
    }

    fn editable_store_for(&self, group: &EntityGroup) -> DirectoryResult<&Arc<dyn GroupStore>> {
        let store = self.store_owning(group.service_name())?;
        if !store.is_editable() {
            return Err(StoreError::NotEditable(group.local_key().to_owned()).into());
        }
        Ok(store)
    }

    fn apply_scope(
        &self,
        found: Vec<EntityIdentifier>,
        ancestor: Option<&EntityIdentifier>,
    ) -> DirectoryResult<Vec<EntityIdentifier>> {
        let Some(ancestor) = ancestor else {
            return Ok(found);
        };
        match self.member_closure(ancestor)? {
            Some(closure) => Ok(scope_to(found, &closure)),
            // An absent ancestor scopes everything away.
            None => Ok(Vec::new()),
        }
    }

    /// The underlying identifiers of every deep member of `ancestor`.
    fn member_closure(
        &self,
        ancestor: &EntityIdentifier,
    ) -> DirectoryResult<Option<HashSet<EntityIdentifier>>> {
        let id = CompositeEntityIdentifier::parse(ancestor.key(), TypeTag::Group)?;
        let Some(group) = self.resolve_group(&id)? else {
            return Ok(None);
        };
        let graph = self.graph();
        let mut closure = HashSet::new();
        for member in graph.all_members(&group) {
            closure.insert(member?.underlying_identifier());
        }
        Ok(Some(closure))
    }
}

/// Spans the membership graph across the whole federation. Member groups
/// from services that are not mounted resolve to `None`, which the
/// traversal layer treats as a dangling reference.
impl GroupResolver for FederatedDirectory {
    fn resolve_group(&self, id: &CompositeEntityIdentifier) -> GraphResult<Option<EntityGroup>> {
        match self.root.store_for(id.service_name()) {
            Some(store) => Ok(store.find(id.local_key())?),
            None => Ok(None),
        }
    }

    fn containing_groups(&self, member: &EntityIdentifier) -> GraphResult<Vec<EntityGroup>> {
        let mut containing = Vec::new();
        for (_, store) in self.root.leaf_services() {
            containing.extend(store.find_containing_groups(member)?);
        }
        containing.sort_by(|a, b| a.composite_identifier().cmp(b.composite_identifier()));
        containing.dedup_by(|a, b| a.composite_identifier() == b.composite_identifier());
        Ok(containing)
    }
}
