use cohort_federation::{
    DirectoryConfig, DirectoryError, FederatedDirectory, ServiceNode,
};
use cohort_locks::{LockConfig, LockError, LockService};
use cohort_model::{Entity, EntityGroup};
use cohort_store::{GroupStore, MemoryStore, StoreError};
use cohort_types::{
    CompositeEntityIdentifier, EntityIdentifier, SearchMethod, SearchQuery, ServiceName,
    TypeTag,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn service(path: &str) -> ServiceName {
    ServiceName::parse(path).unwrap()
}

fn store_at(path: &str) -> Arc<MemoryStore> {
    let locks = Arc::new(LockService::new(LockConfig::default()));
    Arc::new(MemoryStore::new(service(path), locks))
}

fn group_in(path: &str, local_key: &str, name: &str) -> EntityGroup {
    let id = CompositeEntityIdentifier::new(service(path), local_key, TypeTag::Group).unwrap();
    EntityGroup::new(id, name, TypeTag::Person)
}

fn person(key: &str) -> Entity {
    Entity::new(key, TypeTag::Person)
}

/// Two leaf services under one component: campus.staff and campus.students.
fn campus_directory() -> (FederatedDirectory, Arc<MemoryStore>, Arc<MemoryStore>) {
    init_tracing();
    let staff = store_at("campus.staff");
    let students = store_at("campus.students");

    let mut root = ServiceNode::component();
    root.mount(&service("campus.staff"), staff.clone() as Arc<dyn GroupStore>)
        .unwrap();
    root.mount(
        &service("campus.students"),
        students.clone() as Arc<dyn GroupStore>,
    )
    .unwrap();

    let config = DirectoryConfig {
        default_service: service("campus.staff"),
        ..DirectoryConfig::default()
    };
    (FederatedDirectory::new(config, root), staff, students)
}

// ── routing ───────────────────────────────────────────────────────

#[test]
fn components_group_services_and_leaves_own_groups() {
    let (directory, _, _) = campus_directory();
    let root = directory.root();

    assert!(!root.is_leaf_service());
    assert!(!root.resolve(&service("campus")).unwrap().is_leaf_service());
    assert!(root
        .resolve(&service("campus.staff"))
        .unwrap()
        .is_leaf_service());
    assert!(root.store_for(&service("campus")).is_none());
    assert!(root.store_for(&service("campus.staff")).is_some());
}

#[test]
fn leaf_services_are_enumerated_in_name_order() {
    let (directory, _, _) = campus_directory();
    let names: Vec<String> = directory
        .root()
        .leaf_services()
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(names, vec!["campus.staff", "campus.students"]);
}

#[test]
fn mounting_twice_at_one_path_is_rejected() {
    let mut root = ServiceNode::component();
    root.mount(&service("a.b"), store_at("a.b") as Arc<dyn GroupStore>)
        .unwrap();
    let err = root
        .mount(&service("a.b"), store_at("a.b") as Arc<dyn GroupStore>)
        .unwrap_err();
    assert!(matches!(err, DirectoryError::MountConflict(..)));
}

#[test]
fn mounting_below_a_leaf_is_rejected() {
    let mut root = ServiceNode::component();
    root.mount(&service("a"), store_at("a") as Arc<dyn GroupStore>)
        .unwrap();
    let err = root
        .mount(&service("a.b"), store_at("a.b") as Arc<dyn GroupStore>)
        .unwrap_err();
    assert!(matches!(err, DirectoryError::MountConflict(..)));
}

#[test]
fn unknown_service_paths_fail_lookups() {
    let (directory, _, _) = campus_directory();

    let err = directory.find_group("campus.alumni.g1").unwrap_err();
    assert!(matches!(err, DirectoryError::UnknownService(path) if path == "campus.alumni"));

    let err = directory
        .get_entity_in(&service("campus.alumni"), "zoe", TypeTag::Person)
        .unwrap_err();
    assert!(matches!(err, DirectoryError::UnknownService(_)));
}

// ── lookup through the facade ─────────────────────────────────────

#[test]
fn find_group_routes_by_service_path() {
    let (directory, staff, students) = campus_directory();
    staff.seed_group(group_in("campus.staff", "faculty", "Faculty"));
    students.seed_group(group_in("campus.students", "freshmen", "Freshmen"));

    let found = directory.find_group("campus.staff.faculty").unwrap().unwrap();
    assert_eq!(found.name(), "Faculty");

    let found = directory
        .find_group("campus.students.freshmen")
        .unwrap()
        .unwrap();
    assert_eq!(found.name(), "Freshmen");

    assert!(directory.find_group("campus.staff.freshmen").unwrap().is_none());
}

#[test]
fn group_member_resolution_follows_the_tag() {
    let (directory, staff, _) = campus_directory();
    staff.seed_group(group_in("campus.staff", "faculty", "Faculty"));

    let member = directory
        .get_group_member("campus.staff.faculty", TypeTag::Group)
        .unwrap()
        .unwrap();
    assert!(member.is_group());

    let member = directory
        .get_group_member("alice", TypeTag::Person)
        .unwrap()
        .unwrap();
    assert!(!member.is_group());

    assert!(directory
        .get_group_member("campus.staff.nothing", TypeTag::Group)
        .unwrap()
        .is_none());
}

#[test]
fn entities_scoped_to_a_service_carry_its_path() {
    let (directory, _, _) = campus_directory();
    let entity = directory
        .get_entity_in(&service("campus.students"), "zoe", TypeTag::Person)
        .unwrap();
    assert_eq!(entity.key(), "campus.students.zoe");
}

#[test]
fn distinguished_groups_resolve_through_config() {
    let (_, staff, _) = campus_directory();
    staff.seed_group(group_in("campus.staff", "everyone", "Everyone"));

    let mut root = ServiceNode::component();
    root.mount(&service("campus.staff"), staff as Arc<dyn GroupStore>)
        .unwrap();
    let mut config = DirectoryConfig {
        default_service: service("campus.staff"),
        ..DirectoryConfig::default()
    };
    config
        .distinguished_groups
        .insert("everyone".into(), "campus.staff.everyone".into());
    let directory = FederatedDirectory::new(config, root);

    assert_eq!(
        directory.distinguished_group_key("everyone"),
        Some("campus.staff.everyone")
    );
    let group = directory.get_distinguished_group("everyone").unwrap().unwrap();
    assert_eq!(group.name(), "Everyone");
    assert!(directory.get_distinguished_group("admins").unwrap().is_none());
}

// ── creation and commit ───────────────────────────────────────────

#[test]
fn new_group_reserves_a_key_in_the_default_service() {
    let (directory, _, _) = campus_directory();
    let mut group = directory.new_group(TypeTag::Person).unwrap();
    assert_eq!(group.service_name(), &service("campus.staff"));

    group.set_name("New Hires");
    directory.update_group(&group).unwrap();
    let key = group.composite_identifier().format();
    let found = directory.find_group(&key).unwrap().unwrap();
    assert_eq!(found.name(), "New Hires");
}

#[test]
fn commits_to_a_read_only_service_are_refused_before_the_store_call() {
    let locks = Arc::new(LockService::new(LockConfig::default()));
    let frozen = Arc::new(MemoryStore::new(service("archive"), locks).read_only());
    frozen.seed_group(group_in("archive", "g1", "Old Guard"));

    let mut root = ServiceNode::component();
    root.mount(&service("archive"), frozen as Arc<dyn GroupStore>)
        .unwrap();
    let directory = FederatedDirectory::new(DirectoryConfig::default(), root);

    let group = directory.find_group("archive.g1").unwrap().unwrap();
    let err = directory.update_group(&group).unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Store(StoreError::NotEditable(_))
    ));
    let err = directory.delete_group(&group).unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Store(StoreError::NotEditable(_))
    ));
}

#[test]
fn lockable_find_hands_out_a_write_lease() {
    let (directory, staff, _) = campus_directory();
    staff.seed_group(group_in("campus.staff", "faculty", "Faculty"));

    let (group, lock) = directory
        .find_lockable_group("campus.staff.faculty", "editor-1")
        .unwrap()
        .unwrap();
    assert_eq!(group.name(), "Faculty");
    assert_eq!(lock.owner(), "editor-1");

    // A second editor is shut out while the lease stands.
    let err = directory
        .find_lockable_group("campus.staff.faculty", "editor-2")
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::Store(StoreError::Lock(LockError::Conflict { .. }))
    ));
}

// ── federation-spanning graph ─────────────────────────────────────

#[test]
fn deep_membership_crosses_service_boundaries() {
    let (directory, staff, students) = campus_directory();

    let mut tutors = group_in("campus.students", "tutors", "Tutors");
    tutors.insert_member(person("zoe").into());
    students.seed_group(tutors.clone());

    // A staff group holding a member group from another service.
    let mut teaching = group_in("campus.staff", "teaching", "Teaching");
    teaching.insert_member(tutors.into());
    staff.seed_group(teaching.clone());

    let graph = directory.graph();
    let zoe = EntityIdentifier::new("zoe", TypeTag::Person);
    assert!(graph.deep_contains(&teaching, &zoe).unwrap());

    let containing: Vec<_> = graph
        .all_containing_groups(&zoe)
        .collect::<Result<_, _>>()
        .unwrap();
    let names: Vec<&str> = containing.iter().map(EntityGroup::name).collect();
    assert_eq!(names, vec!["Tutors", "Teaching"]);
}

// ── federated search ──────────────────────────────────────────────

#[test]
fn group_search_unions_services_and_sorts_by_local_key() {
    let (directory, staff, students) = campus_directory();
    staff.seed_group(group_in("campus.staff", "zz-eng", "engineering"));
    students.seed_group(group_in("campus.students", "aa-eng", "english"));
    students.seed_group(group_in("campus.students", "mm-math", "maths"));

    let query = SearchQuery::new("eng", SearchMethod::StartsWith, TypeTag::Person);
    let found = directory.search_for_groups(&query).unwrap();
    let keys: Vec<&str> = found.iter().map(EntityIdentifier::key).collect();
    assert_eq!(
        keys,
        vec!["campus.students.aa-eng", "campus.staff.zz-eng"]
    );
}

#[test]
fn entity_search_is_not_group_search() {
    let (directory, staff, _) = campus_directory();
    let mut eng = group_in("campus.staff", "eng", "eng");
    eng.insert_member(person("engelbert").into());
    eng.insert_member(person("alice").into());
    staff.seed_group(eng);

    let query = SearchQuery::new("eng", SearchMethod::StartsWith, TypeTag::Person);
    let found = directory.search_for_entities(&query).unwrap();
    let keys: Vec<&str> = found.iter().map(EntityIdentifier::key).collect();
    // The group named "eng" matches the group search only.
    assert_eq!(keys, vec!["engelbert"]);
}

#[test]
fn ancestor_scoping_keeps_only_deep_members() {
    let (directory, staff, students) = campus_directory();

    let inside = group_in("campus.students", "eng-club", "engine club");
    students.seed_group(inside.clone());
    let outside = group_in("campus.students", "eng-alumni", "engineers at large");
    students.seed_group(outside);

    let mut root_org = group_in("campus.staff", "root-org", "Root Org");
    root_org.insert_member(inside.into());
    staff.seed_group(root_org.clone());

    let query = SearchQuery::new("engine", SearchMethod::StartsWith, TypeTag::Person)
        .scoped_to(root_org.entity_identifier());
    let found = directory.search_for_groups(&query).unwrap();
    let keys: Vec<&str> = found.iter().map(EntityIdentifier::key).collect();
    assert_eq!(keys, vec!["campus.students.eng-club"]);
}

#[test]
fn scoping_to_an_absent_ancestor_yields_nothing() {
    let (directory, staff, _) = campus_directory();
    staff.seed_group(group_in("campus.staff", "eng", "engineering"));

    let ghost = EntityIdentifier::new("campus.staff.ghost", TypeTag::Group);
    let query =
        SearchQuery::new("eng", SearchMethod::StartsWith, TypeTag::Person).scoped_to(ghost);
    assert!(directory.search_for_groups(&query).unwrap().is_empty());
}

#[test]
fn multipath_reachability_yields_each_identifier_once() {
    let (directory, staff, _) = campus_directory();

    let shared = group_in("campus.staff", "eng-core", "engineering core");
    staff.seed_group(shared.clone());
    let mut left = group_in("campus.staff", "left", "Left");
    left.insert_member(shared.clone().into());
    let mut right = group_in("campus.staff", "right", "Right");
    right.insert_member(shared.into());
    let mut root_org = group_in("campus.staff", "root-org", "Root Org");
    root_org.insert_member(left.clone().into());
    root_org.insert_member(right.clone().into());
    for g in [&left, &right, &root_org] {
        staff.seed_group(g.clone());
    }

    let query = SearchQuery::new("engineering", SearchMethod::StartsWith, TypeTag::Person)
        .scoped_to(root_org.entity_identifier());
    let found = directory.search_for_groups(&query).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key(), "campus.staff.eng-core");
}

// ── key helpers ───────────────────────────────────────────────────

#[test]
fn key_helpers_delegate_to_the_codec() {
    let (directory, _, _) = campus_directory();
    assert_eq!(
        directory.parse_local_key("svcA.svcB.user42").unwrap(),
        "user42"
    );
    let name = directory.parse_service_name("svcA.svcB").unwrap();
    assert_eq!(name.segments(), ["svcA", "svcB"]);
    assert!(directory.parse_local_key("a..b").is_err());
}
