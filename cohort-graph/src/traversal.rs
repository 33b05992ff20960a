//! Lazy, cycle-safe traversal over the deep closure.

use crate::resolver::GroupResolver;
use crate::{GraphError, GraphResult};
use cohort_model::{EntityGroup, GroupMember};
use cohort_types::EntityIdentifier;
use std::collections::{HashSet, VecDeque};
use tracing::warn;

/// Iterates the recursively-retrieved members of a group, breadth-first.
///
/// Each underlying identifier is yielded at most once even when reachable
/// via multiple paths, and the visited set bounds the walk on cyclic data.
/// Member groups are re-resolved through the resolver before descending, so
/// the walk sees current store state rather than embedded snapshots; a
/// member key that no longer resolves is descended into as far as its
/// snapshot allows and logged.
///
/// The iterator is lazy: stores are only consulted as the caller advances.
/// After yielding an error it is fused.
pub struct DeepMembers<'a> {
    resolver: &'a dyn GroupResolver,
    queue: VecDeque<GroupMember>,
    visited: HashSet<EntityIdentifier>,
    done: bool,
}

impl<'a> DeepMembers<'a> {
    pub(crate) fn new(resolver: &'a dyn GroupResolver, start: &EntityGroup) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start.entity_identifier());
        let mut queue = VecDeque::new();
        for member in start.members() {
            if visited.insert(member.underlying_identifier()) {
                queue.push_back(member.clone());
            }
        }
        Self {
            resolver,
            queue,
            visited,
            done: false,
        }
    }

    /// Enqueues the direct members of `group` that were not seen yet.
    fn descend(&mut self, group: &EntityGroup) {
        for member in group.members() {
            if self.visited.insert(member.underlying_identifier()) {
                self.queue.push_back(member.clone());
            }
        }
    }
}

impl Iterator for DeepMembers<'_> {
    type Item = GraphResult<GroupMember>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let member = self.queue.pop_front()?;
        if let GroupMember::Group(snapshot) = &member {
            match self.resolver.resolve_group(snapshot.composite_identifier()) {
                Ok(Some(fresh)) => {
                    self.descend(&fresh);
                    return Some(Ok(GroupMember::from(fresh)));
                }
                Ok(None) => {
                    warn!(
                        key = %snapshot.composite_identifier(),
                        "member group no longer resolves; descending into snapshot"
                    );
                    self.descend(snapshot);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(member))
    }
}

/// Iterates the recursively-retrieved containing groups of a member.
///
/// Parent edges are derived by asking the stores which groups list the
/// member; nothing is cached as a back-pointer. Duplicate-free and finite
/// on cyclic data, same as [`DeepMembers`].
pub struct ContainingGroups<'a> {
    resolver: &'a dyn GroupResolver,
    queue: VecDeque<EntityGroup>,
    visited: HashSet<EntityIdentifier>,
    deep: bool,
    done: bool,
    seed_error: Option<GraphError>,
}

impl<'a> ContainingGroups<'a> {
    pub(crate) fn new(
        resolver: &'a dyn GroupResolver,
        member: &EntityIdentifier,
        deep: bool,
    ) -> Self {
        let mut this = Self {
            resolver,
            queue: VecDeque::new(),
            visited: HashSet::from([member.clone()]),
            deep,
            done: false,
            seed_error: None,
        };
        if let Err(e) = this.ascend(member) {
            this.queue.clear();
            this.done = true;
            // Surface the seed failure on first `next`.
            this.seed_error = Some(e);
        }
        this
    }

    /// Enqueues the direct containing groups of `id` that were not seen yet.
    fn ascend(&mut self, id: &EntityIdentifier) -> GraphResult<()> {
        for group in self.resolver.containing_groups(id)? {
            if self.visited.insert(group.entity_identifier()) {
                self.queue.push_back(group);
            }
        }
        Ok(())
    }
}

impl Iterator for ContainingGroups<'_> {
    type Item = GraphResult<EntityGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.seed_error.take() {
            return Some(Err(e));
        }
        if self.done {
            return None;
        }
        let group = self.queue.pop_front()?;
        if self.deep {
            if let Err(e) = self.ascend(&group.entity_identifier()) {
                self.done = true;
                return Some(Err(e));
            }
        }
        Some(Ok(group))
    }
}
