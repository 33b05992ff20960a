//! Containment queries and membership mutation checks.

use crate::resolver::GroupResolver;
use crate::traversal::{ContainingGroups, DeepMembers};
use crate::{GraphError, GraphResult};
use cohort_model::{Entity, EntityGroup, GroupMember};
use cohort_types::EntityIdentifier;

/// The membership algebra over a resolver.
///
/// A `GroupGraph` borrows a [`GroupResolver`] and answers containment and
/// closure queries against it. Mutations (`add_member` / `remove_member`)
/// change the group in memory only; committing is the store's job.
pub struct GroupGraph<'a> {
    resolver: &'a dyn GroupResolver,
}

impl<'a> GroupGraph<'a> {
    /// Creates a graph view over `resolver`.
    pub fn new(resolver: &'a dyn GroupResolver) -> Self {
        Self { resolver }
    }

    // ── containment queries ──────────────────────────────────────

    /// Answers if `member` is a direct element of `group`'s member set.
    #[must_use]
    pub fn contains(&self, group: &EntityGroup, member: &EntityIdentifier) -> bool {
        group.has_member(member)
    }

    /// Answers if `member` is reachable from `group` through one or more
    /// direct-membership edges.
    ///
    /// `deep_contains(g, g)` is false by definition; a group never contains
    /// itself, and pre-existing cycles in the store cannot make it so.
    pub fn deep_contains(
        &self,
        group: &EntityGroup,
        member: &EntityIdentifier,
    ) -> GraphResult<bool> {
        if *member == group.entity_identifier() {
            return Ok(false);
        }
        for found in self.all_members(group) {
            if found?.underlying_identifier() == *member {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Answers if `member` is a direct member of `group`, from the member's
    /// perspective. Derived by asking the stores which groups list the
    /// member.
    pub fn is_member_of(
        &self,
        member: &EntityIdentifier,
        group: &EntityGroup,
    ) -> GraphResult<bool> {
        let target = group.entity_identifier();
        for parent in self.containing_groups(member) {
            if parent?.entity_identifier() == target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Answers if `member` is a deep member of `group`.
    pub fn is_deep_member_of(
        &self,
        member: &EntityIdentifier,
        group: &EntityGroup,
    ) -> GraphResult<bool> {
        let target = group.entity_identifier();
        for ancestor in self.all_containing_groups(member) {
            if ancestor?.entity_identifier() == target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── closures ─────────────────────────────────────────────────

    /// The deep member closure of `group`: every member reachable through
    /// membership edges, each underlying identifier exactly once. Lazy and
    /// finite even on cyclic store data.
    #[must_use]
    pub fn all_members(&self, group: &EntityGroup) -> DeepMembers<'a> {
        DeepMembers::new(self.resolver, group)
    }

    /// The leaf entities of the deep member closure.
    pub fn all_entities(
        &self,
        group: &EntityGroup,
    ) -> impl Iterator<Item = GraphResult<Entity>> + use<'a> {
        self.all_members(group).filter_map(|item| match item {
            Ok(member) => match member {
                GroupMember::Entity(entity) => Some(Ok(entity)),
                GroupMember::Group(_) => None,
            },
            Err(e) => Some(Err(e)),
        })
    }

    /// The groups that directly contain `member`.
    #[must_use]
    pub fn containing_groups(&self, member: &EntityIdentifier) -> ContainingGroups<'a> {
        ContainingGroups::new(self.resolver, member, false)
    }

    /// The recursively-retrieved containing groups of `member`.
    #[must_use]
    pub fn all_containing_groups(&self, member: &EntityIdentifier) -> ContainingGroups<'a> {
        ContainingGroups::new(self.resolver, member, true)
    }

    // ── mutation ─────────────────────────────────────────────────

    /// Adds `member` to `group` in memory.
    ///
    /// Rejected before any store write:
    /// - `CircularReference` if `member` is `group` itself, or is a group of
    ///   which `group` is already a deep member (the add would close a
    ///   cycle);
    /// - `DuplicateName` if `member` is a group whose name collides with an
    ///   existing direct member group.
    ///
    /// The cycle check walks both the passed member group and its current
    /// store copy: the snapshot may carry uncommitted in-memory edges the
    /// stores have not seen, and the stores may hold edges the snapshot
    /// predates. Either closing the cycle rejects the add.
    pub fn add_member(&self, group: &mut EntityGroup, member: GroupMember) -> GraphResult<()> {
        let group_id = group.entity_identifier();
        if member.underlying_identifier() == group_id {
            return Err(GraphError::CircularReference {
                group: group_id.to_string(),
                member: group_id.to_string(),
            });
        }

        if let GroupMember::Group(candidate) = &member {
            if group.member_group_named(candidate.name()).is_some() {
                return Err(GraphError::DuplicateName(candidate.name().to_owned()));
            }
            if self.deep_contains(candidate, &group_id)? {
                return Err(GraphError::CircularReference {
                    group: group_id.to_string(),
                    member: candidate.entity_identifier().to_string(),
                });
            }
            if let Some(fresh) = self.resolver.resolve_group(candidate.composite_identifier())? {
                if self.deep_contains(&fresh, &group_id)? {
                    return Err(GraphError::CircularReference {
                        group: group_id.to_string(),
                        member: fresh.entity_identifier().to_string(),
                    });
                }
            }
        }

        group.insert_member(member);
        Ok(())
    }

    /// Removes the member with the given underlying identifier from
    /// `group`'s in-memory set. Removing an absent member is a no-op.
    pub fn remove_member(&self, group: &mut EntityGroup, member: &EntityIdentifier) -> bool {
        group.remove_member(member)
    }
}
