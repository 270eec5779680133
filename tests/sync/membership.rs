use crate::helpers::TestApp;
use crewhub::domain::{MemberRole, ProjectPassword};
use secrecy::Secret;
use test_context::test_context;

#[test_context(TestApp)]
#[tokio::test]
async fn joining_a_project_adds_it_to_the_list(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let theirs = app
        .remote_create_project(owner, "Community theatre", None)
        .await;

    let joined = app
        .sync
        .join_project(&theirs.project_id, None)
        .await
        .expect("Failed to join project");
    assert_eq!(joined.project_id, theirs.project_id);
    assert_eq!(joined.member_count, 1);

    let projects = app.sync.projects();
    assert!(projects
        .iter()
        .any(|project| project.project_id == theirs.project_id));
}

#[test_context(TestApp)]
#[tokio::test]
async fn joining_twice_is_success_without_duplicates(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let theirs = app
        .remote_create_project(owner, "Community theatre", None)
        .await;

    let first = app.sync.join_project(&theirs.project_id, None).await;
    let second = app.sync.join_project(&theirs.project_id, None).await;
    assert!(first.is_some());
    assert!(
        second.is_some(),
        "A repeated join must be treated as success"
    );
    assert_eq!(second.unwrap().member_count, 1);

    let entries = app
        .sync
        .projects()
        .iter()
        .filter(|project| project.project_id == theirs.project_id)
        .count();
    assert_eq!(entries, 1);
}

#[test_context(TestApp)]
#[tokio::test]
async fn joining_requires_the_correct_password(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let theirs = app
        .remote_create_project(owner, "Invite only", Some("open sesame"))
        .await;

    let before = app.sync.projects();
    let wrong =
        ProjectPassword::parse(Secret::new("wrong one".to_owned())).unwrap();
    assert!(app
        .sync
        .join_project(&theirs.project_id, Some(&wrong))
        .await
        .is_none());
    assert!(app.sync.join_project(&theirs.project_id, None).await.is_none());
    assert_eq!(app.sync.projects(), before);

    let correct =
        ProjectPassword::parse(Secret::new("open sesame".to_owned()))
            .unwrap();
    assert!(app
        .sync
        .join_project(&theirs.project_id, Some(&correct))
        .await
        .is_some());
}

#[test_context(TestApp)]
#[tokio::test]
async fn leaving_removes_exactly_that_project(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let first = app.remote_create_project(owner, "First troupe", None).await;
    let second =
        app.remote_create_project(owner, "Second troupe", None).await;

    app.sync.join_project(&first.project_id, None).await.unwrap();
    app.sync.join_project(&second.project_id, None).await.unwrap();
    assert_eq!(app.sync.projects().len(), 3);

    app.sync.leave_project(&first.project_id).await;

    let remaining = TestApp::project_ids(&app.sync.projects());
    assert!(!remaining.contains(&first.project_id));
    assert!(remaining.contains(&second.project_id));
    assert!(remaining.contains(&app.seed_project.project_id));
}

#[test_context(TestApp)]
#[tokio::test]
async fn leaving_a_project_never_joined_changes_nothing(app: &mut TestApp) {
    let before = app.sync.projects();
    app.sync.leave_project(&app.seed_project.project_id).await;

    // The operation fails remotely (no membership row), so local state is
    // left as it was.
    app.sync.sync().await;
    assert_eq!(app.sync.projects(), before);
}

#[test_context(TestApp)]
#[tokio::test]
async fn remote_membership_insert_adds_the_project(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let theirs = app
        .remote_create_project(owner, "Added by an admin", None)
        .await;

    app.remote_upsert_membership(
        theirs.project_id,
        app.user_id,
        MemberRole::Member,
    )
    .await;

    let projects = app
        .wait_for_projects(|projects| projects.len() == 2)
        .await;
    assert!(projects
        .iter()
        .any(|project| project.project_id == theirs.project_id));
}

#[test_context(TestApp)]
#[tokio::test]
async fn remote_membership_delete_removes_the_project(app: &mut TestApp) {
    let owner = app.add_user("Producer").await;
    let theirs = app
        .remote_create_project(owner, "Short lived", None)
        .await;
    app.sync.join_project(&theirs.project_id, None).await.unwrap();

    // Kicked by the project admin on another client.
    app.remote_remove_membership(theirs.project_id, app.user_id).await;

    let projects = app
        .wait_for_projects(|projects| projects.len() == 1)
        .await;
    assert_eq!(
        TestApp::project_ids(&projects),
        vec![app.seed_project.project_id]
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn member_list_joins_profiles(app: &mut TestApp) {
    let friend = app.add_user("Stage hand").await;
    app.remote_upsert_membership(
        app.seed_project.project_id,
        friend,
        MemberRole::Member,
    )
    .await;

    let members = app
        .sync
        .members(&app.seed_project.project_id)
        .await
        .expect("Failed to assemble member list");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].membership.user_id, friend);
    assert_eq!(members[0].profile.display_name, "Stage hand");
    assert_eq!(members[0].membership.member_role, MemberRole::Member);
}
