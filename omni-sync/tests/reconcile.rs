//! End-to-end reconciliation against an in-memory identity platform.
//!
//! `FakeOmni` keeps groups as the source of truth and derives each user's
//! `groups` from them on lookup, like the real platform does.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;

use omni_client::{ApiError, IdentityApi};
use omni_core::{Attributes, Group, GroupCatalog, GroupId, GroupUpdate, MemberRef, User, UserId};
use omni_source::{DataSource, EmbeddedGroups, GroupScan, JsonSource, SourceGroup, SourceUser};
use omni_sync::{
    pipeline, sync_users, ApplyStatus, MembershipChange, SyncError, SyncMode, SyncOptions,
    UserOutcome,
};
use serde_json::{json, Value};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake platform
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeOmni {
    users: BTreeMap<String, (UserId, Option<Attributes>)>,
    groups: RefCell<BTreeMap<GroupId, Group>>,
    /// Emit user groups as bare ID strings instead of `{value}` objects.
    bare_group_ids: bool,
    failing_groups: HashSet<GroupId>,
    failing_lookups: HashSet<String>,
    fail_catalog: bool,
    group_writes: RefCell<Vec<GroupUpdate>>,
    attribute_writes: RefCell<Vec<(UserId, Attributes)>>,
}

impl FakeOmni {
    fn with_user(mut self, user_name: &str, id: &str) -> Self {
        self.users
            .insert(user_name.to_string(), (UserId::from(id), None));
        self
    }

    fn with_attributes(mut self, user_name: &str, attrs: Value) -> Self {
        if let (Some(entry), Value::Object(map)) = (self.users.get_mut(user_name), attrs) {
            entry.1 = Some(map);
        }
        self
    }

    fn with_group(self, id: &str, members: &[(&str, &str)]) -> Self {
        let group = Group {
            id: GroupId::from(id),
            display_name: format!("{id}-name"),
            members: members
                .iter()
                .map(|(display, value)| MemberRef::new(*display, &UserId::from(*value)))
                .collect(),
        };
        self.groups.borrow_mut().insert(group.id.clone(), group);
        self
    }

    fn failing_group(mut self, id: &str) -> Self {
        self.failing_groups.insert(GroupId::from(id));
        self
    }

    fn members_of(&self, id: &str) -> Vec<String> {
        self.groups.borrow()[&GroupId::from(id)]
            .members
            .iter()
            .filter_map(|m| m.value.clone())
            .collect()
    }

    fn catalog(&self) -> GroupCatalog {
        GroupCatalog::new(self.get_groups().expect("catalog"))
    }
}

fn server_error(url: &str) -> ApiError {
    ApiError::Status {
        method: "PUT",
        url: url.to_string(),
        status: 500,
        body: "{\"detail\":\"boom\"}".to_string(),
    }
}

impl IdentityApi for FakeOmni {
    fn get_groups(&self) -> Result<Vec<Group>, ApiError> {
        if self.fail_catalog {
            return Err(ApiError::Transport {
                method: "GET",
                url: "fake://Groups".into(),
                message: "connection refused".into(),
            });
        }
        Ok(self.groups.borrow().values().cloned().collect())
    }

    fn get_user(&self, user_name: &str) -> Result<Option<User>, ApiError> {
        if self.failing_lookups.contains(user_name) {
            return Err(ApiError::Transport {
                method: "GET",
                url: "fake://Users".into(),
                message: "timed out".into(),
            });
        }
        let Some((id, attributes)) = self.users.get(user_name) else {
            return Ok(None);
        };
        let groups: Vec<Value> = self
            .groups
            .borrow()
            .values()
            .filter(|g| g.members.iter().any(|m| m.refers_to(id)))
            .map(|g| {
                if self.bare_group_ids {
                    json!(g.id.0)
                } else {
                    json!({"value": g.id.0, "display": g.display_name})
                }
            })
            .collect();
        let mut user: User = serde_json::from_value(json!({
            "id": id.0,
            "userName": user_name,
            "groups": groups
        }))
        .expect("fake user");
        user.attributes = attributes.clone();
        Ok(Some(user))
    }

    fn update_group(&self, update: &GroupUpdate) -> Result<(), ApiError> {
        self.group_writes.borrow_mut().push(update.clone());
        if self.failing_groups.contains(&update.id) {
            return Err(server_error(&format!("fake://Groups/{}", update.id)));
        }
        if let Some(group) = self.groups.borrow_mut().get_mut(&update.id) {
            group.members = update.members.clone();
        }
        Ok(())
    }

    fn update_user_attributes(
        &self,
        user_id: &UserId,
        attributes: &Attributes,
    ) -> Result<(), ApiError> {
        self.attribute_writes
            .borrow_mut()
            .push((user_id.clone(), attributes.clone()));
        Ok(())
    }
}

fn desired(user_name: &str, groups: Value) -> SourceUser {
    SourceUser {
        user_name: user_name.to_string(),
        id: None,
        display_name: None,
        groups,
        attributes: None,
    }
}

fn groups_only() -> SyncOptions {
    SyncOptions {
        mode: SyncMode::Groups,
        dry_run: false,
    }
}

// ---------------------------------------------------------------------------
// 1. Group mutations
// ---------------------------------------------------------------------------

#[test]
fn moving_between_groups_removes_then_adds() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[("ann@example.com", "u1"), ("bob", "u2")])
        .with_group("g2", &[("carol", "u3")]);
    let users = vec![desired("ann@example.com", json!([{"value": "g2"}]))];

    let mut catalog = api.catalog();
    let report = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

    let writes = api.group_writes.borrow();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].id, GroupId::from("g1"));
    assert_eq!(writes[0].members, vec![MemberRef::new("bob", &UserId::from("u2"))]);
    assert_eq!(writes[1].id, GroupId::from("g2"));
    assert_eq!(
        writes[1].members.last(),
        Some(&MemberRef::new("ann@example.com", &UserId::from("u1")))
    );
    assert_eq!(writes[1].display_name, "g2-name");

    assert_eq!(report.groups.users_needing_update, 1);
    assert_eq!(report.groups.attempted, 2);
    assert_eq!(report.groups.succeeded, 2);
    assert!(report.is_success());
}

#[test]
fn csv_group_scan_drives_membership() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[])
        .with_group("g2", &[("ann@example.com", "u1")]);
    let resolver = GroupScan::new(vec![
        SourceGroup {
            id: Some("g1".into()),
            display_name: None,
            members: Some(json!(r#""[""u1"",""u2""]""#)),
        },
        SourceGroup {
            id: Some("g2".into()),
            display_name: None,
            members: Some(json!("[]")),
        },
    ]);
    let users = vec![desired("ann@example.com", Value::Null)];

    let mut catalog = api.catalog();
    let report = sync_users(&api, &users, &resolver, &mut catalog, groups_only());

    assert_eq!(api.members_of("g1"), vec!["u1"]);
    assert!(api.members_of("g2").is_empty());
    assert_eq!(report.groups.succeeded, 2);
}

#[test]
fn unknown_desired_group_is_skipped_with_warning() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[]);
    let users = vec![desired(
        "ann@example.com",
        json!([{"value": "g1"}, {"value": "ghost"}]),
    )];

    let mut catalog = api.catalog();
    let report = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

    assert_eq!(report.groups.attempted, 1);
    assert_eq!(report.groups.succeeded, 1);
    match &report.outcomes[0] {
        UserOutcome::Processed {
            groups: Some(groups),
            ..
        } => {
            assert!(groups
                .warnings
                .iter()
                .any(|w| w.contains("unknown group ID: ghost")));
            assert_eq!(groups.mutations.len(), 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn one_failed_write_does_not_stop_the_run() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_user("bob@example.com", "u2")
        .with_group("g1", &[])
        .with_group("g2", &[])
        .with_group("g3", &[])
        .with_group("g4", &[])
        .failing_group("g2");
    let users = vec![
        desired(
            "ann@example.com",
            json!([{"value": "g1"}, {"value": "g2"}, {"value": "g3"}]),
        ),
        desired("bob@example.com", json!([{"value": "g4"}])),
    ];

    let mut catalog = api.catalog();
    let report = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

    assert_eq!(report.groups.attempted, 4);
    assert_eq!(report.groups.succeeded, 3);
    assert_eq!(report.failed_writes(), 1);
    assert!(!report.is_success());
    assert_eq!(api.members_of("g4"), vec!["u2"], "next user still processed");

    let UserOutcome::Processed {
        groups: Some(groups),
        ..
    } = &report.outcomes[0]
    else {
        panic!("ann should be processed");
    };
    let failed = groups
        .mutations
        .iter()
        .find(|m| m.group_id == GroupId::from("g2"))
        .expect("g2 mutation");
    match &failed.status {
        ApplyStatus::Failed { detail, .. } => {
            assert_eq!(detail.as_deref(), Some("{\"detail\":\"boom\"}"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn same_group_writes_build_on_each_other() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_user("bob@example.com", "u2")
        .with_group("g1", &[]);
    let users = vec![
        desired("ann@example.com", json!([{"value": "g1"}])),
        desired("bob@example.com", json!([{"value": "g1"}])),
    ];

    let mut catalog = api.catalog();
    sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

    assert_eq!(api.members_of("g1"), vec!["u1", "u2"]);
    let refreshed = catalog.get(&GroupId::from("g1")).expect("g1");
    assert_eq!(refreshed.members.len(), 2);
}

// ---------------------------------------------------------------------------
// 2. No-op paths
// ---------------------------------------------------------------------------

#[test]
fn matching_membership_is_never_written_regardless_of_shape() {
    for bare in [true, false] {
        let mut api = FakeOmni::default()
            .with_user("ann@example.com", "u1")
            .with_group("g1", &[("ann@example.com", "u1")])
            .with_group("g2", &[("ann@example.com", "u1")]);
        api.bare_group_ids = bare;
        let users = vec![desired(
            "ann@example.com",
            json!([{"display": "g1", "value": "g1"}, {"value": "g2"}]),
        )];

        let mut catalog = api.catalog();
        let report = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

        assert!(api.group_writes.borrow().is_empty(), "bare={bare}");
        assert_eq!(report.groups.users_needing_update, 0);
    }
}

#[test]
fn second_run_is_a_no_op() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[("ann@example.com", "u1")])
        .with_group("g2", &[]);
    let users = vec![desired("ann@example.com", json!([{"value": "g2"}]))];

    let mut catalog = api.catalog();
    let first = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());
    assert_eq!(first.groups.attempted, 2);

    let mut catalog = api.catalog();
    let second = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());
    assert_eq!(second.groups.users_needing_update, 0);
    assert_eq!(second.groups.attempted, 0);
    assert_eq!(api.group_writes.borrow().len(), 2);
}

#[test]
fn missing_and_failing_users_are_skipped() {
    let mut api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_user("flaky@example.com", "u9")
        .with_group("g1", &[]);
    api.failing_lookups.insert("flaky@example.com".into());
    let users = vec![
        desired("ghost@example.com", json!([{"value": "g1"}])),
        desired("flaky@example.com", json!([{"value": "g1"}])),
        desired("ann@example.com", json!([{"value": "g1"}])),
    ];

    let mut catalog = api.catalog();
    let report = sync_users(&api, &users, &EmbeddedGroups, &mut catalog, groups_only());

    assert_eq!(report.users_processed, 3);
    assert_eq!(report.users_not_found, 1);
    assert_eq!(report.users_failed, 1);
    assert_eq!(report.groups.attempted, 1);
    assert!(matches!(report.outcomes[0], UserOutcome::NotFound { .. }));
    assert!(matches!(report.outcomes[1], UserOutcome::LookupFailed { .. }));
}

#[test]
fn dry_run_plans_without_writing() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[])
        .with_attributes("ann@example.com", json!({"region": "emea"}));
    let mut user = desired("ann@example.com", json!([{"value": "g1"}]));
    user.attributes = Some(serde_json::from_value(json!({"region": "apac"})).expect("attrs"));

    let mut catalog = api.catalog();
    let report = sync_users(
        &api,
        &[user],
        &EmbeddedGroups,
        &mut catalog,
        SyncOptions {
            mode: SyncMode::All,
            dry_run: true,
        },
    );

    assert!(api.group_writes.borrow().is_empty());
    assert!(api.attribute_writes.borrow().is_empty());
    assert_eq!(report.groups.planned, 1);
    assert_eq!(report.attributes.planned, 1);
    assert_eq!(report.groups.attempted, 0);
    let UserOutcome::Processed {
        groups: Some(groups),
        ..
    } = &report.outcomes[0]
    else {
        panic!("processed");
    };
    assert_eq!(groups.mutations[0].change, MembershipChange::Add);
    assert_eq!(groups.mutations[0].status, ApplyStatus::Planned);
}

// ---------------------------------------------------------------------------
// 3. Attributes
// ---------------------------------------------------------------------------

#[test]
fn attributes_mode_only_touches_attributes() {
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[])
        .with_attributes("ann@example.com", json!({"region": "emea", "team": "core"}));
    let mut user = desired("ann@example.com", json!([{"value": "g1"}]));
    user.attributes = Some(serde_json::from_value(json!({"region": "apac"})).expect("attrs"));

    let mut catalog = GroupCatalog::default();
    let report = sync_users(
        &api,
        &[user],
        &EmbeddedGroups,
        &mut catalog,
        SyncOptions {
            mode: SyncMode::Attributes,
            dry_run: false,
        },
    );

    assert!(api.group_writes.borrow().is_empty());
    let writes = api.attribute_writes.borrow();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        Value::Object(writes[0].1.clone()),
        json!({"region": "apac", "team": "core"})
    );
    assert_eq!(report.attributes.succeeded, 1);
    assert_eq!(report.groups.attempted, 0);
}

// ---------------------------------------------------------------------------
// 4. Pipeline
// ---------------------------------------------------------------------------

fn json_source(dir: &TempDir, doc: Value) -> JsonSource {
    let path = dir.path().join("users.json");
    fs::write(&path, doc.to_string()).expect("write users.json");
    JsonSource::open(path).expect("open")
}

#[test]
fn pipeline_runs_from_a_json_file() {
    let dir = TempDir::new().expect("tempdir");
    let source = json_source(
        &dir,
        json!([{"userName": "ann@example.com", "groups": [{"value": "g2"}]}]),
    );
    let api = FakeOmni::default()
        .with_user("ann@example.com", "u1")
        .with_group("g1", &[("ann@example.com", "u1")])
        .with_group("g2", &[]);

    let report = pipeline::run(&api, &source, groups_only()).expect("run");
    assert_eq!(report.groups.succeeded, 2);
    assert_eq!(api.members_of("g2"), vec!["u1"]);
    assert!(api.members_of("g1").is_empty());
    assert_eq!(source.kind().to_string(), "JSON");
}

#[test]
fn pipeline_fails_fast_when_catalog_is_unavailable() {
    let dir = TempDir::new().expect("tempdir");
    let source = json_source(&dir, json!([{"userName": "ann@example.com"}]));
    let mut api = FakeOmni::default().with_user("ann@example.com", "u1");
    api.fail_catalog = true;

    let err = pipeline::run(&api, &source, groups_only()).unwrap_err();
    assert!(matches!(err, SyncError::Catalog(_)), "got: {err}");
    assert!(api.group_writes.borrow().is_empty());
}

#[test]
fn empty_catalog_reports_every_desired_group_unknown() {
    let dir = TempDir::new().expect("tempdir");
    let source = json_source(
        &dir,
        json!([{"userName": "ann@example.com", "groups": [{"value": "g1"}]}]),
    );
    let api = FakeOmni::default().with_user("ann@example.com", "u1");

    let report = pipeline::run(&api, &source, groups_only()).expect("run");
    assert_eq!(report.groups.users_needing_update, 1);
    assert_eq!(report.groups.attempted, 0);
    assert!(api.group_writes.borrow().is_empty());
    let UserOutcome::Processed {
        groups: Some(groups),
        ..
    } = &report.outcomes[0]
    else {
        panic!("processed");
    };
    assert_eq!(groups.warnings, vec!["unknown group ID: g1".to_string()]);
}

#[test]
fn attributes_only_pipeline_skips_catalog_fetch() {
    let dir = TempDir::new().expect("tempdir");
    let source = json_source(
        &dir,
        json!([{
            "userName": "ann@example.com",
            "urn:omni:params:1.0:UserAttribute": {"region": "emea"}
        }]),
    );
    let mut api = FakeOmni::default().with_user("ann@example.com", "u1");
    api.fail_catalog = true;

    let report = pipeline::run(
        &api,
        &source,
        SyncOptions {
            mode: SyncMode::Attributes,
            dry_run: false,
        },
    )
    .expect("attributes run does not need groups");
    assert_eq!(report.attributes.succeeded, 1);
}
