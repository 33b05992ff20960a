use cohort_graph::{GraphError, GroupGraph, StoreResolver};
use cohort_locks::{LockConfig, LockService};
use cohort_model::{Entity, EntityGroup, GroupMember};
use cohort_store::{GroupStore, MemoryStore};
use cohort_types::{
    CompositeEntityIdentifier, EntityIdentifier, ServiceName, TypeTag,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn store() -> MemoryStore {
    let locks = Arc::new(LockService::new(LockConfig::default()));
    MemoryStore::new(ServiceName::parse("campus").unwrap(), locks)
}

fn resolver(store: &Arc<MemoryStore>) -> StoreResolver {
    StoreResolver::new(
        ServiceName::parse("campus").unwrap(),
        Arc::clone(store) as Arc<dyn GroupStore>,
    )
}

fn group(local_key: &str, name: &str) -> EntityGroup {
    let id = CompositeEntityIdentifier::new(
        ServiceName::parse("campus").unwrap(),
        local_key,
        TypeTag::Group,
    )
    .unwrap();
    EntityGroup::new(id, name, TypeTag::Person)
}

fn person(key: &str) -> Entity {
    Entity::new(key, TypeTag::Person)
}

/// Engineering contains Backend contains alice.
fn engineering_fixture() -> (Arc<MemoryStore>, EntityGroup, EntityGroup) {
    let store = Arc::new(store());
    let mut backend = group("backend", "Backend");
    backend.insert_member(person("alice").into());
    let mut engineering = group("eng", "Engineering");
    engineering.insert_member(backend.clone().into());
    store.update(&backend).unwrap();
    store.update(&engineering).unwrap();
    (store, engineering, backend)
}

// ── direct and deep containment ───────────────────────────────────

#[test]
fn contains_is_direct_only() {
    let (store, engineering, backend) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let alice = EntityIdentifier::new("alice", TypeTag::Person);

    assert!(graph.contains(&backend, &alice));
    assert!(!graph.contains(&engineering, &alice));
    assert!(graph.contains(&engineering, &backend.entity_identifier()));
}

#[test]
fn deep_contains_reaches_through_member_groups() {
    let (store, engineering, _) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let alice = EntityIdentifier::new("alice", TypeTag::Person);

    assert!(graph.deep_contains(&engineering, &alice).unwrap());
}

#[test]
fn deep_contains_self_is_always_false() {
    let (store, engineering, _) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    assert!(!graph
        .deep_contains(&engineering, &engineering.entity_identifier())
        .unwrap());
}

#[test]
fn membership_queries_from_the_member_side() {
    let (store, engineering, backend) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let alice = EntityIdentifier::new("alice", TypeTag::Person);

    assert!(graph.is_member_of(&alice, &backend).unwrap());
    assert!(!graph.is_member_of(&alice, &engineering).unwrap());
    assert!(graph.is_deep_member_of(&alice, &engineering).unwrap());
}

// ── closures ──────────────────────────────────────────────────────

#[test]
fn all_members_yields_each_identifier_once() {
    // Diamond: org contains a and b; both contain carol.
    let store = Arc::new(store());
    let mut a = group("a", "A");
    let mut b = group("b", "B");
    a.insert_member(person("carol").into());
    b.insert_member(person("carol").into());
    let mut org = group("org", "Org");
    org.insert_member(a.clone().into());
    org.insert_member(b.clone().into());
    for g in [&a, &b, &org] {
        store.update(g).unwrap();
    }

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let members: Vec<GroupMember> = graph
        .all_members(&org)
        .collect::<Result<_, _>>()
        .unwrap();
    let carols = members
        .iter()
        .filter(|m| m.underlying_identifier().key() == "carol")
        .count();
    assert_eq!(carols, 1);
    assert_eq!(members.len(), 3); // a, b, carol
}

#[test]
fn all_members_terminates_on_preexisting_cycle() {
    // Seed a cycle directly into the store, bypassing add_member.
    let store = Arc::new(store());
    let mut a = group("a", "A");
    let mut b = group("b", "B");
    a.insert_member(b.clone().into());
    b.insert_member(a.clone().into());
    b.insert_member(person("alice").into());
    store.seed_group(a.clone());
    store.seed_group(b);

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let members: Vec<GroupMember> = graph
        .all_members(&a)
        .collect::<Result<_, _>>()
        .unwrap();
    // b and alice; a itself is never yielded.
    assert_eq!(members.len(), 2);
    assert!(graph
        .deep_contains(&a, &EntityIdentifier::new("alice", TypeTag::Person))
        .unwrap());
}

#[test]
fn dangling_member_group_is_walked_as_its_snapshot() {
    let store = Arc::new(store());
    let mut ghost = group("ghost", "Ghost");
    ghost.insert_member(person("alice").into());
    let mut eng = group("eng", "Engineering");
    eng.insert_member(ghost.into());
    eng.insert_member(person("dave").into());
    // eng is stored; the ghost member group never is.
    store.seed_group(eng.clone());

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let members: Vec<GroupMember> = graph
        .all_members(&eng)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(members.len(), 3); // ghost, dave, alice
    assert!(graph
        .deep_contains(&eng, &EntityIdentifier::new("alice", TypeTag::Person))
        .unwrap());
}

#[test]
fn all_entities_filters_out_groups() {
    let (store, engineering, _) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    let entities: Vec<_> = graph
        .all_entities(&engineering)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].key(), "alice");
}

#[test]
fn all_containing_groups_walks_upward() {
    let (store, engineering, backend) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let alice = EntityIdentifier::new("alice", TypeTag::Person);

    let direct: Vec<_> = graph
        .containing_groups(&alice)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].local_key(), backend.local_key());

    let deep: Vec<_> = graph
        .all_containing_groups(&alice)
        .collect::<Result<_, _>>()
        .unwrap();
    let keys: Vec<_> = deep.iter().map(EntityGroup::local_key).collect();
    assert!(keys.contains(&backend.local_key()));
    assert!(keys.contains(&engineering.local_key()));
}

#[test]
fn traversal_uses_current_store_state_not_snapshots() {
    let (store, engineering, mut backend) = engineering_fixture();

    // Commit a new backend member after Engineering embedded its snapshot.
    backend.insert_member(person("dave").into());
    store.update_members(&backend).unwrap();

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    assert!(graph
        .deep_contains(&engineering, &EntityIdentifier::new("dave", TypeTag::Person))
        .unwrap());
}

// ── add_member integrity ──────────────────────────────────────────

#[test]
fn add_member_rejects_self() {
    let (store, mut engineering, _) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    let err = graph
        .add_member(&mut engineering.clone(), engineering.clone().into())
        .unwrap_err();
    assert!(matches!(err, GraphError::CircularReference { .. }));
}

#[test]
fn add_member_rejects_cycle_through_committed_membership() {
    let store = Arc::new(store());
    let mut a = group("a", "A");
    let b = group("b", "B");
    store.update(&b).unwrap();

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    graph.add_member(&mut a, b.clone().into()).unwrap();
    store.update(&a).unwrap();

    // B now (durably) belongs to A; adding A to B must close no cycle.
    let mut b = store.find("b").unwrap().unwrap();
    let err = graph
        .add_member(&mut b, store.find("a").unwrap().unwrap().into())
        .unwrap_err();
    assert!(matches!(err, GraphError::CircularReference { .. }));
}

#[test]
fn add_member_rejects_cycle_through_uncommitted_membership() {
    let store = Arc::new(store());
    let mut a = group("a", "A");
    let mut b = group("b", "B");
    store.update(&a).unwrap();
    store.update(&b).unwrap();

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    // A gains B in memory only; the stores still see both groups empty.
    graph.add_member(&mut a, b.clone().into()).unwrap();

    let err = graph.add_member(&mut b, a.clone().into()).unwrap_err();
    assert!(matches!(err, GraphError::CircularReference { .. }));
}

#[test]
fn add_member_rejects_duplicate_sibling_group_name() {
    let store = Arc::new(store());
    let first = group("team1", "Platform");
    let second = group("team2", "Platform");
    store.update(&first).unwrap();
    store.update(&second).unwrap();

    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let mut org = group("org", "Org");
    graph.add_member(&mut org, first.into()).unwrap();

    let err = graph.add_member(&mut org, second.into()).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateName(name) if name == "Platform"));
}

#[test]
fn add_member_allows_same_entity_name_in_different_branches() {
    let (store, _, mut backend) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    // Entities never collide on name, only member groups do.
    graph
        .add_member(&mut backend, person("platform").into())
        .unwrap();
    assert!(backend.has_member(&EntityIdentifier::new("platform", TypeTag::Person)));
}

#[test]
fn add_member_mutates_memory_only() {
    let (store, mut engineering, _) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);

    graph
        .add_member(&mut engineering, person("erin").into())
        .unwrap();
    let stored = store.find("eng").unwrap().unwrap();
    assert!(!stored.has_member(&EntityIdentifier::new("erin", TypeTag::Person)));
}

#[test]
fn remove_member_is_idempotent_through_the_graph() {
    let (store, _, mut backend) = engineering_fixture();
    let resolver = resolver(&store);
    let graph = GroupGraph::new(&resolver);
    let alice = EntityIdentifier::new("alice", TypeTag::Person);

    assert!(graph.remove_member(&mut backend, &alice));
    assert!(!graph.remove_member(&mut backend, &alice));
    assert!(backend.is_empty());
}
