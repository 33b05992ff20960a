//! The uniform contract each federated service implements.

use crate::error::StoreResult;
use cohort_locks::EntityLock;
use cohort_model::{Entity, EntityGroup};
use cohort_types::{EntityIdentifier, SearchMethod, TypeTag};

/// Finds and maintains groups within one federated service.
///
/// Keys passed to `find`-style methods are local to this service; the
/// composite routing that strips service paths happens in the federation
/// layer before a store is reached.
///
/// Implementations are shared behind `Arc` and called from many threads;
/// interior synchronization is the store's responsibility. `update` /
/// `update_members` must be atomic per group from the caller's point of
/// view. Callers wanting exclusivity across find-edit-commit acquire an
/// advisory write lock first; the store does not enforce that.
pub trait GroupStore: Send + Sync {
    /// Returns the group stored under `local_key`, or `None`.
    fn find(&self, local_key: &str) -> StoreResult<Option<EntityGroup>>;

    /// Returns the group stored under `local_key` together with a freshly
    /// acquired write lease for `lock_owner`, or `None` if the group does
    /// not exist. Fails if a conflicting lock is held.
    fn find_lockable(
        &self,
        local_key: &str,
        lock_owner: &str,
    ) -> StoreResult<Option<(EntityGroup, EntityLock)>>;

    /// Answers whether the stored membership rows of `group` include
    /// `member`.
    fn contains(&self, group: &EntityGroup, member: &EntityIdentifier) -> StoreResult<bool>;

    /// Deletes the group and every membership referencing it.
    fn delete(&self, group: &EntityGroup) -> StoreResult<()>;

    /// Commits the group's attributes and memberships to the store.
    fn update(&self, group: &EntityGroup) -> StoreResult<()>;

    /// Commits the group's memberships to the store, replacing the stored
    /// membership rows with the group's current in-memory member set.
    fn update_members(&self, group: &EntityGroup) -> StoreResult<()>;

    /// Returns the composite keys of member groups. In a federation a group
    /// may contain a member group from a different service (a foreign
    /// membership); this store can return that key but not the group itself.
    fn find_member_group_keys(&self, group: &EntityGroup) -> StoreResult<Vec<String>>;

    /// Returns the leaf entities that are direct members of `group`.
    fn find_entities_for_group(&self, group: &EntityGroup) -> StoreResult<Vec<Entity>>;

    /// Returns the groups in this service that directly contain `member`.
    /// This is a derived query over membership rows; stores never keep
    /// parent back-pointers.
    fn find_containing_groups(&self, member: &EntityIdentifier) -> StoreResult<Vec<EntityGroup>>;

    /// Finds identifiers of groups whose name matches `pattern` under
    /// `method` and whose leaf type is `leaf_type`.
    fn search_for_groups(
        &self,
        pattern: &str,
        method: SearchMethod,
        leaf_type: TypeTag,
    ) -> StoreResult<Vec<EntityIdentifier>>;

    /// Finds identifiers of leaf entities whose key matches `pattern` under
    /// `method` and whose kind is `tag`. Distinct from group search.
    fn search_for_entities(
        &self,
        pattern: &str,
        method: SearchMethod,
        tag: TypeTag,
    ) -> StoreResult<Vec<EntityIdentifier>>;

    /// Returns a new, unsaved group with an unused key reserved in this
    /// service, collecting leaves of `leaf_type`.
    fn new_instance(&self, leaf_type: TypeTag) -> StoreResult<EntityGroup>;

    /// Answers whether this service accepts updates and deletes.
    fn is_editable(&self) -> bool;
}
