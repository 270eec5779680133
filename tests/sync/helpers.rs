use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crewhub::app_state::{AppState, AuthClientType};
use crewhub::domain::{
    AuthClient, AuthClientError, Email, MemberRole, Membership, OriginId,
    Profile, Project, ProjectId, ProjectName, ProjectPassword, ProjectStore,
    ProjectStoreError, ProfileStore, Session, UserId,
};
use crewhub::services::data_stores::{
    BroadcastChangeFeed, HashmapProfileStore, HashmapProjectStore,
    HashmapRoleStore,
};
use crewhub::services::{ProjectSync, SessionStore};
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::Secret;
use test_context::AsyncTestContext;
use tokio::sync::RwLock;
use tokio::time::timeout;

pub const SYNC_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestApp {
    pub state: AppState,
    pub sessions: Arc<SessionStore>,
    pub sync: ProjectSync,
    pub feed: BroadcastChangeFeed,
    pub user_id: UserId,
    pub seed_project: Project,
    pub remote_origin: OriginId,
    pub owned_reads: Arc<AtomicUsize>,
    project_store: HashmapProjectStore,
    role_store: HashmapRoleStore,
    profile_store: HashmapProfileStore,
}

impl TestApp {
    pub async fn new() -> Self {
        let feed = BroadcastChangeFeed::default();
        let origin = OriginId::default();
        let remote_origin = OriginId::default();

        let project_store =
            HashmapProjectStore::with_feed(feed.clone(), origin);
        let role_store = HashmapRoleStore::with_feed(feed.clone(), origin);
        let profile_store = HashmapProfileStore::default();

        let counting = CountingProjectStore::new(project_store.clone());
        let owned_reads = counting.reads.clone();

        let state = AppState::new(
            Arc::new(RwLock::new(counting)),
            Arc::new(RwLock::new(role_store.clone())),
            Arc::new(RwLock::new(profile_store.clone())),
            Arc::new(feed.clone()),
            origin,
        );

        let sessions = Arc::new(SessionStore::new(
            Arc::new(NoAuthClient) as AuthClientType,
        ));

        // Sign the test user in and seed one owned project before the sync
        // service starts, so the first list it publishes is non-empty and
        // observing it proves the feed subscriptions are live.
        let user_id = UserId::default();
        add_profile(&profile_store, user_id, "Test user").await;
        let seed_project = seed_remote_project(
            &project_store,
            remote_origin,
            user_id,
            "Seed project",
        )
        .await;
        sessions.set_session(make_session(user_id));

        let sync = ProjectSync::start(&state, sessions.subscribe());
        let mut list = sync.subscribe();
        timeout(SYNC_TIMEOUT, list.wait_for(|projects| !projects.is_empty()))
            .await
            .expect("Timed out waiting for the initial synchronization")
            .expect("Project sync stopped publishing");

        Self {
            state,
            sessions,
            sync,
            feed,
            user_id,
            seed_project,
            remote_origin,
            owned_reads,
            project_store,
            role_store,
            profile_store,
        }
    }

    // Store handle acting as another client with its own origin.
    pub fn remote_project_store(&self) -> HashmapProjectStore {
        self.project_store.handle(Some(self.remote_origin))
    }

    pub fn remote_role_store(&self) -> HashmapRoleStore {
        self.role_store.handle(Some(self.remote_origin))
    }

    pub async fn add_user(&self, display_name: &str) -> UserId {
        let user_id = UserId::default();
        add_profile(&self.profile_store, user_id, display_name).await;
        user_id
    }

    pub async fn remote_create_project(
        &self,
        owner: UserId,
        name: &str,
        password: Option<&str>,
    ) -> Project {
        let project = Project::new(
            ProjectName::parse(name).expect("Invalid project name"),
            owner,
            None,
            password.map(|password| {
                ProjectPassword::parse(Secret::new(password.to_owned()))
                    .expect("Invalid project password")
            }),
        );
        let mut store = self.remote_project_store();
        store
            .add_project(&project)
            .await
            .expect("Failed to create remote project");
        project
    }

    pub async fn remote_upsert_membership(
        &self,
        project: ProjectId,
        user: UserId,
        member_role: MemberRole,
    ) {
        self.remote_project_store()
            .upsert_membership(&Membership::new(project, user, member_role))
            .await
            .expect("Failed to upsert remote membership");
    }

    pub async fn remote_remove_membership(
        &self,
        project: ProjectId,
        user: UserId,
    ) {
        self.remote_project_store()
            .remove_membership(&project, &user)
            .await
            .expect("Failed to remove remote membership");
    }

    pub async fn remote_delete_project(&self, project: ProjectId) {
        self.remote_project_store()
            .delete_project(&project)
            .await
            .expect("Failed to delete remote project");
    }

    pub async fn wait_for_projects<F>(&self, predicate: F) -> Vec<Project>
    where
        F: FnMut(&Vec<Project>) -> bool,
    {
        let mut list = self.sync.subscribe();
        let result = timeout(SYNC_TIMEOUT, list.wait_for(predicate))
            .await
            .expect("Timed out waiting for the project list")
            .expect("Project sync stopped publishing")
            .clone();
        result
    }

    pub fn project_ids(projects: &[Project]) -> Vec<ProjectId> {
        projects.iter().map(|project| project.project_id).collect()
    }
}

impl AsyncTestContext for TestApp {
    async fn setup() -> TestApp {
        TestApp::new().await
    }

    async fn teardown(self) {}
}

pub fn make_session(user_id: UserId) -> Session {
    let claims = serde_json::json!({
        "sub": user_id.as_ref().to_string(),
        "exp": (Utc::now().timestamp() + 3600) as usize,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret("test-secret".as_bytes()),
    )
    .expect("Failed to encode test token");

    Session::new(
        user_id,
        Email::parse(Secret::new(format!(
            "{}@example.com",
            user_id.as_ref()
        )))
        .expect("Invalid test email"),
        Secret::new(token),
        Secret::new("refresh-token".to_owned()),
        Utc::now() + chrono::Duration::hours(1),
    )
}

async fn add_profile(
    store: &HashmapProfileStore,
    user_id: UserId,
    display_name: &str,
) {
    let mut store = store.handle();
    store
        .upsert_profile(&Profile::new(
            user_id,
            Email::parse(Secret::new(format!(
                "{}@example.com",
                user_id.as_ref()
            )))
            .expect("Invalid test email"),
            display_name.to_owned(),
        ))
        .await
        .expect("Failed to add profile");
}

async fn seed_remote_project(
    store: &HashmapProjectStore,
    remote_origin: OriginId,
    owner: UserId,
    name: &str,
) -> Project {
    let project = Project::new(
        ProjectName::parse(name).expect("Invalid project name"),
        owner,
        None,
        None,
    );
    store
        .handle(Some(remote_origin))
        .add_project(&project)
        .await
        .expect("Failed to seed project");
    project
}

// No-op auth backend; integration tests install sessions directly.
struct NoAuthClient;

#[async_trait::async_trait]
impl AuthClient for NoAuthClient {
    async fn refresh_session(
        &self,
        _refresh_token: &Secret<String>,
    ) -> Result<Session, AuthClientError> {
        Err(AuthClientError::SessionExpired)
    }

    async fn sign_out(
        &self,
        _access_token: &Secret<String>,
    ) -> Result<(), AuthClientError> {
        Ok(())
    }
}

// Delegating wrapper that counts full owned-project reads, so tests can
// assert which flows re-fetch and which apply changes locally.
pub struct CountingProjectStore {
    inner: HashmapProjectStore,
    pub reads: Arc<AtomicUsize>,
}

impl CountingProjectStore {
    pub fn new(inner: HashmapProjectStore) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl ProjectStore for CountingProjectStore {
    async fn get_owned_projects(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, ProjectStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_owned_projects(owner).await
    }

    async fn get_joined_project_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<ProjectId>, ProjectStoreError> {
        self.inner.get_joined_project_ids(user).await
    }

    async fn get_projects(
        &self,
        ids: &[ProjectId],
    ) -> Result<Vec<Project>, ProjectStoreError> {
        self.inner.get_projects(ids).await
    }

    async fn get_project(
        &self,
        id: &ProjectId,
    ) -> Result<Project, ProjectStoreError> {
        self.inner.get_project(id).await
    }

    async fn add_project(
        &mut self,
        project: &Project,
    ) -> Result<(), ProjectStoreError> {
        self.inner.add_project(project).await
    }

    async fn delete_project(
        &mut self,
        id: &ProjectId,
    ) -> Result<(), ProjectStoreError> {
        self.inner.delete_project(id).await
    }

    async fn verify_password(
        &self,
        id: &ProjectId,
        candidate: &ProjectPassword,
    ) -> Result<bool, ProjectStoreError> {
        self.inner.verify_password(id, candidate).await
    }

    async fn get_members(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Membership>, ProjectStoreError> {
        self.inner.get_members(project).await
    }

    async fn upsert_membership(
        &mut self,
        membership: &Membership,
    ) -> Result<(), ProjectStoreError> {
        self.inner.upsert_membership(membership).await
    }

    async fn remove_membership(
        &mut self,
        project: &ProjectId,
        user: &UserId,
    ) -> Result<(), ProjectStoreError> {
        self.inner.remove_membership(project, user).await
    }
}
