//! In-memory reference store.

use crate::adapter::GroupStore;
use crate::error::{StoreError, StoreResult};
use cohort_locks::{EntityLock, LockKind, LockService};
use cohort_model::{Entity, EntityGroup, GroupMember};
use cohort_types::{
    CompositeEntityIdentifier, EntityIdentifier, SearchMethod, ServiceName, TypeTag,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// An in-process [`GroupStore`] keeping groups in a map behind a mutex.
///
/// Used as the reference leaf service in tests and small deployments. All
/// commits are atomic per group because every operation holds the single
/// store mutex for its whole duration.
pub struct MemoryStore {
    service_name: ServiceName,
    locks: Arc<LockService>,
    read_only: bool,
    // Keyed by local key.
    groups: Mutex<HashMap<String, EntityGroup>>,
}

impl MemoryStore {
    /// Creates an empty, editable store for the given service.
    #[must_use]
    pub fn new(service_name: ServiceName, locks: Arc<LockService>) -> Self {
        Self {
            service_name,
            locks,
            read_only: false,
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Marks the store read-only: all mutating operations fail with
    /// [`StoreError::NotEditable`].
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The service this store backs.
    #[must_use]
    pub const fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    /// Inserts a group directly, bypassing the editability policy (for
    /// seeding fixtures).
    pub fn seed_group(&self, group: EntityGroup) {
        let mut groups = self.groups.lock().expect("store mutex poisoned");
        groups.insert(group.local_key().to_owned(), group);
    }

    fn check_editable(&self, local_key: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::NotEditable(local_key.to_owned()));
        }
        Ok(())
    }

    fn check_owned(&self, group: &EntityGroup) -> StoreResult<()> {
        if group.service_name() != &self.service_name {
            return Err(StoreError::Backend(format!(
                "group `{}` belongs to service `{}`, not `{}`",
                group.local_key(),
                group.service_name(),
                self.service_name
            )));
        }
        Ok(())
    }
}

impl GroupStore for MemoryStore {
    fn find(&self, local_key: &str) -> StoreResult<Option<EntityGroup>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        Ok(groups.get(local_key).cloned())
    }

    fn find_lockable(
        &self,
        local_key: &str,
        lock_owner: &str,
    ) -> StoreResult<Option<(EntityGroup, EntityLock)>> {
        let Some(group) = self.find(local_key)? else {
            return Ok(None);
        };
        let lock = self.locks.acquire(
            &group.entity_identifier(),
            lock_owner,
            LockKind::Write,
            None,
        )?;
        Ok(Some((group, lock)))
    }

    fn contains(&self, group: &EntityGroup, member: &EntityIdentifier) -> StoreResult<bool> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        Ok(groups
            .get(group.local_key())
            .is_some_and(|stored| stored.has_member(member)))
    }

    fn delete(&self, group: &EntityGroup) -> StoreResult<()> {
        self.check_editable(group.local_key())?;
        self.check_owned(group)?;
        let id = group.entity_identifier();
        let mut groups = self.groups.lock().expect("store mutex poisoned");
        groups.remove(group.local_key());
        // Drop every membership that referenced the deleted group.
        for stored in groups.values_mut() {
            stored.remove_member(&id);
        }
        info!(service = %self.service_name, key = group.local_key(), "group deleted");
        Ok(())
    }

    fn update(&self, group: &EntityGroup) -> StoreResult<()> {
        self.check_editable(group.local_key())?;
        self.check_owned(group)?;
        let mut groups = self.groups.lock().expect("store mutex poisoned");
        groups.insert(group.local_key().to_owned(), group.clone());
        debug!(service = %self.service_name, key = group.local_key(), "group committed");
        Ok(())
    }

    fn update_members(&self, group: &EntityGroup) -> StoreResult<()> {
        self.check_editable(group.local_key())?;
        self.check_owned(group)?;
        let mut groups = self.groups.lock().expect("store mutex poisoned");
        match groups.get_mut(group.local_key()) {
            Some(stored) => {
                // Replace membership rows; stored attributes stay as they are.
                stored.clear_members();
                for member in group.members() {
                    stored.insert_member(member.clone());
                }
            }
            None => {
                groups.insert(group.local_key().to_owned(), group.clone());
            }
        }
        debug!(
            service = %self.service_name,
            key = group.local_key(),
            members = group.member_count(),
            "memberships committed"
        );
        Ok(())
    }

    fn find_member_group_keys(&self, group: &EntityGroup) -> StoreResult<Vec<String>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        Ok(groups
            .get(group.local_key())
            .map(|stored| {
                stored
                    .members()
                    .filter_map(GroupMember::as_group)
                    .map(|g| g.composite_identifier().format())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_entities_for_group(&self, group: &EntityGroup) -> StoreResult<Vec<Entity>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        Ok(groups
            .get(group.local_key())
            .map(|stored| {
                stored
                    .members()
                    .filter_map(GroupMember::as_entity)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn find_containing_groups(&self, member: &EntityIdentifier) -> StoreResult<Vec<EntityGroup>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        let mut containing: Vec<EntityGroup> = groups
            .values()
            .filter(|g| g.has_member(member))
            .cloned()
            .collect();
        containing.sort_by(|a, b| a.local_key().cmp(b.local_key()));
        Ok(containing)
    }

    fn search_for_groups(
        &self,
        pattern: &str,
        method: SearchMethod,
        leaf_type: TypeTag,
    ) -> StoreResult<Vec<EntityIdentifier>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        let mut found: Vec<EntityIdentifier> = groups
            .values()
            .filter(|g| g.leaf_type() == leaf_type && method.matches(pattern, g.name()))
            .map(EntityGroup::entity_identifier)
            .collect();
        found.sort();
        Ok(found)
    }

    fn search_for_entities(
        &self,
        pattern: &str,
        method: SearchMethod,
        tag: TypeTag,
    ) -> StoreResult<Vec<EntityIdentifier>> {
        let groups = self.groups.lock().expect("store mutex poisoned");
        let found: BTreeSet<EntityIdentifier> = groups
            .values()
            .flat_map(EntityGroup::members)
            .filter_map(GroupMember::as_entity)
            .map(Entity::underlying_identifier)
            .filter(|id| id.tag() == tag && method.matches(pattern, id.key()))
            .cloned()
            .collect();
        Ok(found.into_iter().collect())
    }

    fn new_instance(&self, leaf_type: TypeTag) -> StoreResult<EntityGroup> {
        self.check_editable("<new>")?;
        let local_key = Uuid::now_v7().to_string();
        let id = CompositeEntityIdentifier::new(self.service_name.clone(), local_key, TypeTag::Group)?;
        debug!(service = %self.service_name, key = id.local_key(), "reserved key for new group");
        Ok(EntityGroup::new(id, "", leaf_type))
    }

    fn is_editable(&self) -> bool {
        !self.read_only
    }
}
