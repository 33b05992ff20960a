//! The composite group node.

use crate::member::GroupMember;
use cohort_types::{CompositeEntityIdentifier, EntityIdentifier, ServiceName, TypeTag};
use serde::{Deserialize, Serialize};

/// A composite node in the directory: a named group containing entities and
/// other groups.
///
/// All mutators change memory only. A group becomes durable when a caller
/// commits it through the owning store (`update` / `update_members`); the
/// integrity checks on membership changes (circular references, duplicate
/// sibling names) are applied by the graph layer before a member lands here.
///
/// The member set is keyed by underlying identifier and kept sorted by it,
/// so iteration order is deterministic and duplicates are impossible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    id: CompositeEntityIdentifier,
    name: String,
    leaf_type: TypeTag,
    description: Option<String>,
    creator_id: Option<String>,
    members: Vec<GroupMember>,
}

impl EntityGroup {
    /// Creates an empty group whose leaf members are of `leaf_type`.
    pub fn new(id: CompositeEntityIdentifier, name: impl Into<String>, leaf_type: TypeTag) -> Self {
        Self {
            id,
            name: name.into(),
            leaf_type,
            description: None,
            creator_id: None,
            members: Vec::new(),
        }
    }

    /// The kind of leaf entity this group collects. Analogous to an array's
    /// element type; a group of groups still has a leaf type describing the
    /// entities at the bottom.
    #[must_use]
    pub const fn leaf_type(&self) -> TypeTag {
        self.leaf_type
    }

    /// The composite identifier of this group within the federation.
    #[must_use]
    pub const fn composite_identifier(&self) -> &CompositeEntityIdentifier {
        &self.id
    }

    /// The key local to the service of origin.
    #[must_use]
    pub fn local_key(&self) -> &str {
        self.id.local_key()
    }

    /// The name of the service of origin.
    #[must_use]
    pub const fn service_name(&self) -> &ServiceName {
        self.id.service_name()
    }

    /// The flat identifier for this group, keyed by its full composite key.
    /// For a group the member identifier and the underlying identifier are
    /// the same.
    #[must_use]
    pub fn entity_identifier(&self) -> EntityIdentifier {
        self.id.to_entity_identifier()
    }

    /// The group's type tag, always [`TypeTag::Group`].
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        TypeTag::Group
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the group name. Uniqueness among siblings is checked when the
    /// group is added as a member, not here.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the group description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Sets or clears the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Returns the id of the group's creator, if recorded.
    #[must_use]
    pub fn creator_id(&self) -> Option<&str> {
        self.creator_id.as_deref()
    }

    /// Records the id of the group's creator.
    pub fn set_creator_id(&mut self, creator_id: impl Into<String>) {
        self.creator_id = Some(creator_id.into());
    }

    /// Iterates over the direct members in ascending underlying-identifier
    /// order.
    pub fn members(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter()
    }

    /// Number of direct members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the group has no direct members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if `id` names a direct member (by underlying identifier).
    #[must_use]
    pub fn has_member(&self, id: &EntityIdentifier) -> bool {
        self.position(id).is_ok()
    }

    /// Returns the direct member with the given underlying identifier.
    #[must_use]
    pub fn member(&self, id: &EntityIdentifier) -> Option<&GroupMember> {
        self.position(id).ok().map(|i| &self.members[i])
    }

    /// Returns the direct member group with the given name, if any.
    #[must_use]
    pub fn member_group_named(&self, name: &str) -> Option<&EntityGroup> {
        self.members
            .iter()
            .filter_map(GroupMember::as_group)
            .find(|g| g.name() == name)
    }

    /// Inserts a member, replacing any existing membership with the same
    /// underlying identifier. No integrity checks are applied here.
    pub fn insert_member(&mut self, member: GroupMember) {
        match self.position(&member.underlying_identifier()) {
            Ok(i) => self.members[i] = member,
            Err(i) => self.members.insert(i, member),
        }
    }

    /// Removes the member with the given underlying identifier. Returns true
    /// if a membership was removed; removing an absent member is a no-op.
    pub fn remove_member(&mut self, id: &EntityIdentifier) -> bool {
        match self.position(id) {
            Ok(i) => {
                self.members.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Drops all members.
    pub fn clear_members(&mut self) {
        self.members.clear();
    }

    fn position(&self, id: &EntityIdentifier) -> Result<usize, usize> {
        self.members
            .binary_search_by(|m| m.underlying_identifier().cmp(id))
    }
}
