use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Level;

use crate::app_state::{
    AppState, ChangeFeedType, ProfileStoreType, ProjectStoreType,
};
use crate::domain::{
    ChangeFeedError, ChangeFilter, ChangeKind, MemberRole, Membership,
    OriginId, Predicate, Project, ProjectId, ProjectMember, ProjectName,
    ProjectPassword, ProjectStoreError, Relation, RowChange, SyncError,
    UserId,
};
use crate::services::SessionState;
use crate::utils::tracing::log_error_chain;

// Keeps the signed-in user's project list convergent with the backend.
// The list is the union of owned and membership-linked projects,
// deduplicated by ID with the first occurrence preferred. Mutations apply
// optimistically after the remote call succeeds; remote writes by other
// clients arrive through the change feed. Failed operations log the error
// chain and leave prior state unchanged.
pub struct ProjectSync {
    core: Arc<SyncCore>,
    watcher: JoinHandle<()>,
}

struct SyncCore {
    project_store: ProjectStoreType,
    profile_store: ProfileStoreType,
    change_feed: ChangeFeedType,
    origin: OriginId,
    sessions: watch::Receiver<SessionState>,
    projects: watch::Sender<Vec<Project>>,
}

impl ProjectSync {
    pub fn start(
        state: &AppState,
        sessions: watch::Receiver<SessionState>,
    ) -> Self {
        let (projects, _) = watch::channel(Vec::new());
        let core = Arc::new(SyncCore {
            project_store: state.project_store.clone(),
            profile_store: state.profile_store.clone(),
            change_feed: state.change_feed.clone(),
            origin: state.origin,
            sessions: sessions.clone(),
            projects,
        });
        let watcher = tokio::spawn(watch_sessions(core.clone(), sessions));
        Self { core, watcher }
    }

    pub fn projects(&self) -> Vec<Project> {
        self.core.projects.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Project>> {
        self.core.projects.subscribe()
    }

    pub async fn sync(&self) {
        if let Err(e) = self.core.resync().await {
            log_error_chain(&e, Level::ERROR);
        }
    }

    pub async fn create_project(
        &self,
        name: ProjectName,
        due_date: Option<DateTime<Utc>>,
        password: Option<ProjectPassword>,
    ) -> Option<Project> {
        match self.core.create_project(name, due_date, password).await {
            Ok(project) => Some(project),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        }
    }

    pub async fn join_project(
        &self,
        id: &ProjectId,
        password: Option<&ProjectPassword>,
    ) -> Option<Project> {
        match self.core.join_project(id, password).await {
            Ok(project) => Some(project),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        }
    }

    pub async fn leave_project(&self, id: &ProjectId) {
        if let Err(e) = self.core.leave_project(id).await {
            log_error_chain(&e, Level::ERROR);
        }
    }

    pub async fn delete_project(&self, id: &ProjectId) {
        if let Err(e) = self.core.delete_project(id).await {
            log_error_chain(&e, Level::ERROR);
        }
    }

    pub async fn members(&self, id: &ProjectId) -> Option<Vec<ProjectMember>> {
        match self.core.members(id).await {
            Ok(members) => Some(members),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        }
    }
}

impl Drop for ProjectSync {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl SyncCore {
    fn current_user(&self) -> Result<UserId, SyncError> {
        self.sessions
            .borrow()
            .user_id()
            .ok_or(SyncError::NotSignedIn)
    }

    #[tracing::instrument(name = "Resynchronizing project list", skip_all)]
    async fn resync(&self) -> Result<(), SyncError> {
        let user = match self.sessions.borrow().user_id() {
            Some(user) => user,
            None => {
                self.projects.send_replace(Vec::new());
                return Ok(());
            }
        };

        let store = self.project_store.read().await;
        let owned = store
            .get_owned_projects(&user)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
        let joined_ids = store
            .get_joined_project_ids(&user)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
        let joined = store
            .get_projects(&joined_ids)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
        drop(store);

        self.projects.send_replace(merge_by_id(owned, joined));
        Ok(())
    }

    #[tracing::instrument(name = "Creating project", skip_all)]
    async fn create_project(
        &self,
        name: ProjectName,
        due_date: Option<DateTime<Utc>>,
        password: Option<ProjectPassword>,
    ) -> Result<Project, SyncError> {
        let user = self.current_user()?;
        let mut project = Project::new(name, user, due_date, password);

        {
            let mut store = self.project_store.write().await;
            store
                .add_project(&project)
                .await
                .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
            store
                .upsert_membership(&Membership::new(
                    project.project_id,
                    user,
                    MemberRole::Admin,
                ))
                .await
                .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
        }

        project.member_count = 1;
        let created = project.clone();
        self.projects
            .send_modify(|projects| projects.push(created));
        Ok(project)
    }

    #[tracing::instrument(name = "Joining project", skip_all)]
    async fn join_project(
        &self,
        id: &ProjectId,
        password: Option<&ProjectPassword>,
    ) -> Result<Project, SyncError> {
        let user = self.current_user()?;

        let store = self.project_store.read().await;
        let project = store.get_project(id).await.map_err(|e| match e {
            ProjectStoreError::ProjectIdNotFound => {
                SyncError::ProjectNotFound(*id.as_ref())
            }
            e => SyncError::UnexpectedError(eyre!(e)),
        })?;

        if project.has_password() {
            let candidate = password.ok_or(SyncError::IncorrectPassword)?;
            let valid = store
                .verify_password(id, candidate)
                .await
                .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
            if !valid {
                return Err(SyncError::IncorrectPassword);
            }
        }
        drop(store);

        // Upsert keeps a repeated join from surfacing a duplicate error.
        self.project_store
            .write()
            .await
            .upsert_membership(&Membership::new(*id, user, MemberRole::Member))
            .await
            .map_err(|e| match e {
                ProjectStoreError::ProjectIdNotFound => {
                    SyncError::ProjectNotFound(*id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        let joined = self
            .project_store
            .read()
            .await
            .get_project(id)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;

        let spliced = joined.clone();
        self.projects.send_modify(|projects| {
            match projects
                .iter_mut()
                .find(|project| project.project_id == spliced.project_id)
            {
                Some(existing) => *existing = spliced,
                None => projects.push(spliced),
            }
        });
        Ok(joined)
    }

    #[tracing::instrument(name = "Leaving project", skip_all)]
    async fn leave_project(&self, id: &ProjectId) -> Result<(), SyncError> {
        let user = self.current_user()?;
        self.project_store
            .write()
            .await
            .remove_membership(id, &user)
            .await
            .map_err(|e| match e {
                ProjectStoreError::MembershipNotFound => {
                    SyncError::NotAMember(*id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        self.projects.send_modify(|projects| {
            projects.retain(|project| project.project_id != *id)
        });
        Ok(())
    }

    #[tracing::instrument(name = "Deleting project", skip_all)]
    async fn delete_project(&self, id: &ProjectId) -> Result<(), SyncError> {
        self.current_user()?;
        self.project_store
            .write()
            .await
            .delete_project(id)
            .await
            .map_err(|e| match e {
                ProjectStoreError::ProjectIdNotFound => {
                    SyncError::ProjectNotFound(*id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        self.projects.send_modify(|projects| {
            projects.retain(|project| project.project_id != *id)
        });
        Ok(())
    }

    #[tracing::instrument(name = "Assembling member list", skip_all)]
    async fn members(
        &self,
        id: &ProjectId,
    ) -> Result<Vec<ProjectMember>, SyncError> {
        let memberships = self
            .project_store
            .read()
            .await
            .get_members(id)
            .await
            .map_err(|e| match e {
                ProjectStoreError::ProjectIdNotFound => {
                    SyncError::ProjectNotFound(*id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        let user_ids: Vec<UserId> = memberships
            .iter()
            .map(|membership| membership.user_id)
            .collect();
        let profiles = self
            .profile_store
            .read()
            .await
            .get_profiles(&user_ids)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;

        Ok(memberships
            .into_iter()
            .filter_map(|membership| {
                profiles
                    .iter()
                    .find(|profile| profile.user_id == membership.user_id)
                    .cloned()
                    .map(|profile| ProjectMember {
                        membership,
                        profile,
                    })
            })
            .collect())
    }

    #[tracing::instrument(
        name = "Applying remote change",
        skip_all,
        fields(kind = ?change.kind, relation = %change.relation)
    )]
    async fn apply_remote_change(&self, change: RowChange) {
        if change.originated_by(&self.origin) {
            // The optimistic update already applied this one.
            return;
        }

        match change.kind {
            ChangeKind::Delete => {
                self.projects.send_modify(|projects| {
                    projects.retain(|project| {
                        project.project_id != change.project_id
                    })
                });
            }
            ChangeKind::Insert | ChangeKind::Update => {
                if let Err(e) = self.resync().await {
                    log_error_chain(&e, Level::ERROR);
                }
            }
        }
    }
}

async fn watch_sessions(
    core: Arc<SyncCore>,
    mut sessions: watch::Receiver<SessionState>,
) {
    loop {
        let user = sessions.borrow_and_update().user_id();
        let keep_going = match user {
            None => {
                core.projects.send_replace(Vec::new());
                sessions.changed().await.is_ok()
            }
            Some(user) => follow_user(&core, &mut sessions, user).await,
        };
        if !keep_going {
            break;
        }
    }
}

// Holds the feed subscriptions for one signed-in user until the session
// changes. Returns false once the session channel is gone.
async fn follow_user(
    core: &SyncCore,
    sessions: &mut watch::Receiver<SessionState>,
    user: UserId,
) -> bool {
    let feeds = async {
        let owned = core
            .change_feed
            .subscribe(ChangeFilter::with_predicate(
                Relation::Projects,
                Predicate::owner(&user),
            ))
            .await?;
        let memberships = core
            .change_feed
            .subscribe(ChangeFilter::with_predicate(
                Relation::ProjectMembers,
                Predicate::user(&user),
            ))
            .await?;
        Ok::<_, ChangeFeedError>((owned, memberships))
    }
    .await;

    let (mut owned, mut memberships) = match feeds {
        Ok(feeds) => feeds,
        Err(e) => {
            log_error_chain(&e, Level::ERROR);
            if let Err(e) = core.resync().await {
                log_error_chain(&e, Level::ERROR);
            }
            return sessions.changed().await.is_ok();
        }
    };

    if let Err(e) = core.resync().await {
        log_error_chain(&e, Level::ERROR);
    }

    loop {
        tokio::select! {
            changed = sessions.changed() => return changed.is_ok(),
            event = owned.next() => match event {
                Some(change) => core.apply_remote_change(change).await,
                None => return sessions.changed().await.is_ok(),
            },
            event = memberships.next() => match event {
                Some(change) => core.apply_remote_change(change).await,
                None => return sessions.changed().await.is_ok(),
            },
        }
    }
}

// Union of the two lookups, deduplicated by project ID; the first
// occurrence wins.
fn merge_by_id(owned: Vec<Project>, joined: Vec<Project>) -> Vec<Project> {
    let mut seen = HashSet::new();
    owned
        .into_iter()
        .chain(joined)
        .filter(|project| seen.insert(*project.project_id.as_ref()))
        .collect()
}
