use std::sync::Arc;

use crate::helpers::{make_session, TestApp};
use crewhub::domain::UserId;
use crewhub::services::{RestAuthClient, SessionStore};
use secrecy::{ExposeSecret, Secret};
use test_context::test_context;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn restoring_a_session_goes_through_the_auth_service() {
    let server = MockServer::start().await;
    let user_id = UserId::default();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({
                "access_token": "fresh-jwt",
                "refresh_token": "fresh-refresh",
                "expires_in": 3600,
                "user": {
                    "id": user_id.as_ref().to_string(),
                    "email": "crew@example.com"
                }
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::new(Arc::new(RestAuthClient::new(
        server.uri(),
        Secret::new("anon-key".to_owned()),
        reqwest::Client::new(),
    )));

    let session = store
        .restore(Secret::new("persisted-refresh".to_owned()))
        .await
        .expect("Failed to restore session");
    assert_eq!(session.user_id, user_id);
    assert_eq!(store.current_user(), Some(user_id));
    assert_eq!(
        store.current().unwrap().access_token.expose_secret(),
        "fresh-jwt"
    );
}

#[test_context(TestApp)]
#[tokio::test]
async fn clearing_the_session_empties_the_project_list(app: &mut TestApp) {
    assert!(!app.sync.projects().is_empty());

    app.sessions.clear();

    let projects = app.wait_for_projects(|projects| projects.is_empty()).await;
    assert!(projects.is_empty());
}

#[test_context(TestApp)]
#[tokio::test]
async fn switching_user_resynchronizes_for_the_new_user(app: &mut TestApp) {
    let other_user = app.add_user("Second account").await;
    let their_project = app
        .remote_create_project(other_user, "Their production", None)
        .await;

    app.sessions.set_session(make_session(other_user));

    let projects = app
        .wait_for_projects(|projects| {
            projects.len() == 1
                && projects[0].project_id == their_project.project_id
        })
        .await;
    assert_eq!(projects[0].owner_id, other_user);
}

#[test_context(TestApp)]
#[tokio::test]
async fn old_subscriptions_are_torn_down_on_user_switch(app: &mut TestApp) {
    let other_user = app.add_user("Second account").await;
    app.sessions.set_session(make_session(other_user));
    app.wait_for_projects(|projects| projects.is_empty()).await;

    // A write scoped to the previous user must not reappear in the list.
    app.remote_create_project(app.user_id, "For the old account", None)
        .await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(app.sync.projects().is_empty());
}
