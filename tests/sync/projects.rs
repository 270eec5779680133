use std::sync::atomic::Ordering;

use crate::helpers::TestApp;
use crewhub::domain::ProjectName;
use fake::faker::company::en::CompanyName;
use fake::Fake;
use test_context::test_context;

#[test_context(TestApp)]
#[tokio::test]
async fn initial_sync_publishes_owned_projects(app: &mut TestApp) {
    let projects = app.sync.projects();
    assert_eq!(
        TestApp::project_ids(&projects),
        vec![app.seed_project.project_id]
    );
    assert_eq!(projects[0].owner_id, app.user_id);
}

#[test_context(TestApp)]
#[tokio::test]
async fn created_project_appears_without_refetch(app: &mut TestApp) {
    let reads_before = app.owned_reads.load(Ordering::SeqCst);

    let name: String = CompanyName().fake();
    let created = app
        .sync
        .create_project(ProjectName::parse(&name).unwrap(), None, None)
        .await
        .expect("Failed to create project");

    let projects = app.sync.projects();
    assert_eq!(projects.len(), 2);
    assert!(projects
        .iter()
        .any(|project| project.project_id == created.project_id));
    assert_eq!(created.member_count, 1);
    assert_eq!(
        app.owned_reads.load(Ordering::SeqCst),
        reads_before,
        "Creating locally should not trigger a full re-fetch"
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn owned_and_joined_projects_deduplicate(app: &mut TestApp) {
    // The owner also holds a membership row on the seed project, so both
    // lookups now return it.
    app.remote_upsert_membership(
        app.seed_project.project_id,
        app.user_id,
        crewhub::domain::MemberRole::Admin,
    )
    .await;

    let projects = app
        .wait_for_projects(|projects| {
            projects
                .iter()
                .any(|project| project.member_count == 1)
        })
        .await;

    let seed_entries = projects
        .iter()
        .filter(|project| project.project_id == app.seed_project.project_id)
        .count();
    assert_eq!(seed_entries, 1, "Merged list must not contain duplicates");
}

#[test_context(TestApp)]
#[tokio::test]
async fn remote_insert_triggers_full_resync(app: &mut TestApp) {
    let created = app
        .remote_create_project(app.user_id, "Added on another device", None)
        .await;

    let projects = app
        .wait_for_projects(|projects| projects.len() == 2)
        .await;
    assert!(projects
        .iter()
        .any(|project| project.project_id == created.project_id));
}

#[test_context(TestApp)]
#[tokio::test]
async fn remote_delete_applies_locally_without_refetch(app: &mut TestApp) {
    let reads_before = app.owned_reads.load(Ordering::SeqCst);

    app.remote_delete_project(app.seed_project.project_id).await;

    app.wait_for_projects(|projects| projects.is_empty()).await;
    assert_eq!(
        app.owned_reads.load(Ordering::SeqCst),
        reads_before,
        "Delete events must be applied by local filtering"
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn deleting_a_project_removes_it_locally(app: &mut TestApp) {
    let name: String = CompanyName().fake();
    let created = app
        .sync
        .create_project(ProjectName::parse(&name).unwrap(), None, None)
        .await
        .expect("Failed to create project");

    app.sync.delete_project(&created.project_id).await;

    let projects = app.sync.projects();
    assert_eq!(
        TestApp::project_ids(&projects),
        vec![app.seed_project.project_id]
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn failed_delete_leaves_state_unchanged(app: &mut TestApp) {
    let before = app.sync.projects();

    // Unknown ID: the store rejects it, the operation logs and returns.
    app.sync
        .delete_project(&crewhub::domain::ProjectId::default())
        .await;

    assert_eq!(app.sync.projects(), before);
}
