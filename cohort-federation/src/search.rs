//! Federated name search.
//!
//! A query without a target service fans out to every leaf service. Result
//! sets are unioned, de-duplicated by identifier, and ordered by ascending
//! local key so repeated searches are reproducible.

use crate::routing::ServiceNode;
use crate::DirectoryResult;
use cohort_types::{parse_local_key, EntityIdentifier, SearchMethod, TypeTag};
use std::collections::HashSet;
use tracing::debug;

/// Runs a group-name search against every leaf service.
pub(crate) fn fan_out_groups(
    root: &ServiceNode,
    pattern: &str,
    method: SearchMethod,
    leaf_type: TypeTag,
) -> DirectoryResult<Vec<EntityIdentifier>> {
    let mut found = Vec::new();
    for (service, store) in root.leaf_services() {
        let hits = store.search_for_groups(pattern, method, leaf_type)?;
        debug!(service = %service, hits = hits.len(), pattern, "group search");
        found.extend(hits);
    }
    Ok(dedup_sorted(found))
}

/// Runs an entity search against every leaf service. A distinct routine
/// from group search: it matches leaf entities, never groups.
pub(crate) fn fan_out_entities(
    root: &ServiceNode,
    pattern: &str,
    method: SearchMethod,
    tag: TypeTag,
) -> DirectoryResult<Vec<EntityIdentifier>> {
    let mut found = Vec::new();
    for (service, store) in root.leaf_services() {
        let hits = store.search_for_entities(pattern, method, tag)?;
        debug!(service = %service, hits = hits.len(), pattern, "entity search");
        found.extend(hits);
    }
    Ok(dedup_sorted(found))
}

/// Keeps only the identifiers present in `closure`.
pub(crate) fn scope_to(
    found: Vec<EntityIdentifier>,
    closure: &HashSet<EntityIdentifier>,
) -> Vec<EntityIdentifier> {
    found.into_iter().filter(|id| closure.contains(id)).collect()
}

/// Ascending by local key, full identifier as the tie-break, one entry per
/// identifier.
fn dedup_sorted(mut found: Vec<EntityIdentifier>) -> Vec<EntityIdentifier> {
    found.sort_by_cached_key(|id| (local_key_of(id), id.clone()));
    found.dedup();
    found
}

fn local_key_of(id: &EntityIdentifier) -> String {
    parse_local_key(id.key()).unwrap_or_else(|_| id.key().to_owned())
}
