//! Leaf entities and the polymorphic group member.

use crate::group::EntityGroup;
use cohort_types::{EntityIdentifier, TypeTag};
use serde::{Deserialize, Serialize};

/// A leaf member of a group: a reference to an external addressable object
/// such as a user or resource.
///
/// An entity carries two identifiers. `identifier` is how the entity appears
/// as a member (its leaf type within the group); `underlying` names the
/// concrete entity it stands for. They often coincide, but an entity may be
/// a member under a broader leaf type than its concrete kind. Memberships
/// and deduplication always use the underlying identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    identifier: EntityIdentifier,
    underlying: EntityIdentifier,
}

impl Entity {
    /// Creates an entity whose member view and underlying identity coincide.
    pub fn new(key: impl Into<String>, tag: TypeTag) -> Self {
        let id = EntityIdentifier::new(key, tag);
        Self {
            identifier: id.clone(),
            underlying: id,
        }
    }

    /// Creates an entity viewed as `member_tag` over a distinct underlying
    /// identity.
    pub fn with_member_view(underlying: EntityIdentifier, member_tag: TypeTag) -> Self {
        Self {
            identifier: EntityIdentifier::new(underlying.key(), member_tag),
            underlying,
        }
    }

    /// The identifier under which this entity participates in groups.
    #[must_use]
    pub const fn identifier(&self) -> &EntityIdentifier {
        &self.identifier
    }

    /// The identifier of the concrete underlying entity.
    #[must_use]
    pub const fn underlying_identifier(&self) -> &EntityIdentifier {
        &self.underlying
    }

    /// Returns the entity key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.underlying.key()
    }

    /// Returns the member-view type tag.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.identifier.tag()
    }
}

/// A direct member of a group: either a leaf entity or another group.
///
/// Two members are the same membership when their underlying identifiers are
/// equal, regardless of variant payload differences. Member sets and deep
/// traversals rely on this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupMember {
    /// A leaf entity.
    Entity(Entity),
    /// A member group. The embedded group carries its attributes; its own
    /// member set is a snapshot and traversal re-resolves it by identifier.
    Group(Box<EntityGroup>),
}

impl GroupMember {
    /// The identifier under which this member participates in the group.
    #[must_use]
    pub fn identifier(&self) -> EntityIdentifier {
        match self {
            Self::Entity(e) => e.identifier().clone(),
            Self::Group(g) => g.entity_identifier(),
        }
    }

    /// The identifier of the underlying entity. Equal to [`Self::identifier`]
    /// for groups.
    #[must_use]
    pub fn underlying_identifier(&self) -> EntityIdentifier {
        match self {
            Self::Entity(e) => e.underlying_identifier().clone(),
            Self::Group(g) => g.entity_identifier(),
        }
    }

    /// The member's type tag.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Entity(e) => e.tag(),
            Self::Group(_) => TypeTag::Group,
        }
    }

    /// Returns true if this member is a group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Returns the group payload, if this member is a group.
    #[must_use]
    pub fn as_group(&self) -> Option<&EntityGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::Entity(_) => None,
        }
    }

    /// Returns the entity payload, if this member is a leaf entity.
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(e) => Some(e),
            Self::Group(_) => None,
        }
    }
}

impl From<Entity> for GroupMember {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<EntityGroup> for GroupMember {
    fn from(group: EntityGroup) -> Self {
        Self::Group(Box::new(group))
    }
}

impl PartialEq for GroupMember {
    fn eq(&self, other: &Self) -> bool {
        self.underlying_identifier() == other.underlying_identifier()
    }
}

impl Eq for GroupMember {}
