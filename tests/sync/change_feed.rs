use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::helpers::TestApp;
use crewhub::domain::{
    ChangeKind, OriginId, ProjectId, ProjectName, Relation, RowChange,
    UserId,
};
use serde_json::json;
use test_context::test_context;

// The wire shape the backend's notify triggers emit.
fn row_change_schema() -> serde_json::Value {
    json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "type": "object",
        "required": ["relation", "kind", "projectId"],
        "properties": {
            "relation": {
                "type": "string",
                "enum": ["projects", "project_members", "roles"]
            },
            "kind": {
                "type": "string",
                "enum": ["INSERT", "UPDATE", "DELETE"]
            },
            "projectId": {
                "type": "string",
                "minLength": 36,
                "maxLength": 36
            },
            "userId": {
                "type": "string",
                "minLength": 36,
                "maxLength": 36
            },
            "roleId": {
                "type": "string",
                "minLength": 36,
                "maxLength": 36
            },
            "origin": {
                "type": "string",
                "minLength": 36,
                "maxLength": 36
            }
        }
    })
}

#[test]
fn serialized_events_match_the_wire_schema() {
    let schema = row_change_schema();

    let events = [
        RowChange {
            relation: Relation::Projects,
            kind: ChangeKind::Insert,
            project_id: ProjectId::default(),
            user_id: Some(UserId::default()),
            role_id: None,
            origin: Some(OriginId::default()),
        },
        RowChange {
            relation: Relation::Roles,
            kind: ChangeKind::Delete,
            project_id: ProjectId::default(),
            user_id: None,
            role_id: Some(crewhub::domain::RoleId::default()),
            origin: None,
        },
    ];

    for event in events {
        let value = serde_json::to_value(&event)
            .expect("Failed to serialize row change");
        assert!(
            jsonschema::is_valid(&schema, &value),
            "Event does not match the wire schema: {value}"
        );
    }
}

#[test]
fn trigger_payloads_deserialize() {
    let payload = r#"{
        "relation": "project_members",
        "kind": "DELETE",
        "projectId": "0d6ad1f5-17d8-4a22-85a7-2b82ad2b283c",
        "userId": "5e90ca28-e1ad-4795-a190-089959c16e0b",
        "origin": "c4a76034-87d0-461c-a3b1-2c171f9df2cf"
    }"#;

    let change: RowChange =
        serde_json::from_str(payload).expect("Failed to parse payload");
    assert_eq!(change.relation, Relation::ProjectMembers);
    assert_eq!(change.kind, ChangeKind::Delete);
    assert!(change.user_id.is_some());
    assert!(change.role_id.is_none());
    assert!(change.origin.is_some());
}

#[test_context(TestApp)]
#[tokio::test]
async fn locally_originated_events_are_skipped(app: &mut TestApp) {
    // Let the optimistic create settle, then confirm its own echo on the
    // feed did not force a re-fetch.
    let reads_before = app.owned_reads.load(Ordering::SeqCst);
    app.sync
        .create_project(
            ProjectName::parse("Echo check").unwrap(),
            None,
            None,
        )
        .await
        .expect("Failed to create project");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(app.owned_reads.load(Ordering::SeqCst), reads_before);
    assert_eq!(app.sync.projects().len(), 2);
}

#[test_context(TestApp)]
#[tokio::test]
async fn foreign_events_do_force_a_refetch(app: &mut TestApp) {
    let reads_before = app.owned_reads.load(Ordering::SeqCst);

    app.remote_create_project(app.user_id, "From elsewhere", None)
        .await;
    app.wait_for_projects(|projects| projects.len() == 2).await;

    assert!(app.owned_reads.load(Ordering::SeqCst) > reads_before);
}
