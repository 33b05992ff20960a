//! Identifier types used throughout the Cohort core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of entity kinds the directory understands.
///
/// `Group` marks a composite node; every other tag is a leaf kind. This
/// replaces open-ended type tokens with a compile-time enumeration, so
/// capability checks are `is_group()` / `is_entity()` rather than type
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// A composite node that can contain other members.
    Group,
    /// A person (user) leaf entity.
    Person,
    /// A non-person addressable resource leaf entity.
    Resource,
}

impl TypeTag {
    /// Returns true if this tag denotes a group.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }

    /// Returns true if this tag denotes a leaf entity.
    #[must_use]
    pub const fn is_entity(self) -> bool {
        !self.is_group()
    }

    /// Stable string form, used in display and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Person => "person",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies an entity by its key and kind.
///
/// Equality, ordering and hashing are by `(key, tag)`. Deep-traversal
/// deduplication and lock subjects both key on this type, so take care that
/// two references to the same underlying entity compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityIdentifier {
    key: String,
    tag: TypeTag,
}

impl EntityIdentifier {
    /// Creates an identifier from a key and a type tag.
    pub fn new(key: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            key: key.into(),
            tag,
        }
    }

    /// Returns the entity key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.key)
    }
}
