use std::sync::Arc;

use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Level;

use crate::app_state::{AppState, RoleStoreType};
use crate::domain::{
    ChangeFilter, ChangeKind, ChangeSubscription, OriginId, Predicate,
    ProjectId, Relation, Role, RoleId, RoleName, RoleStoreError, RowChange,
    SyncError,
};
use crate::utils::tracing::log_error_chain;

// Synchronized view over one project's roles, following the same contract
// as the project list: optimistic local writes, full re-fetch on remote
// insert/update events, local filtering on deletes.
pub struct RoleSync {
    core: Arc<RoleCore>,
    watcher: JoinHandle<()>,
}

struct RoleCore {
    role_store: RoleStoreType,
    origin: OriginId,
    project_id: ProjectId,
    roles: watch::Sender<Vec<Role>>,
}

impl RoleSync {
    // Opens the board for one project: a scoped subscription plus the
    // initial fetch. The subscription is torn down on drop.
    pub async fn open(state: &AppState, project_id: ProjectId) -> Self {
        let (roles, _) = watch::channel(Vec::new());
        let core = Arc::new(RoleCore {
            role_store: state.role_store.clone(),
            origin: state.origin,
            project_id,
            roles,
        });

        let subscription = match state
            .change_feed
            .subscribe(ChangeFilter::with_predicate(
                Relation::Roles,
                Predicate::project(&project_id),
            ))
            .await
        {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        };

        if let Err(e) = core.resync().await {
            log_error_chain(&e, Level::ERROR);
        }

        let watcher = tokio::spawn(watch_roles(core.clone(), subscription));
        Self { core, watcher }
    }

    pub fn project_id(&self) -> ProjectId {
        self.core.project_id
    }

    pub fn roles(&self) -> Vec<Role> {
        self.core.roles.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Role>> {
        self.core.roles.subscribe()
    }

    pub async fn sync(&self) {
        if let Err(e) = self.core.resync().await {
            log_error_chain(&e, Level::ERROR);
        }
    }

    pub async fn add_role(
        &self,
        name: RoleName,
        deadline: Option<DateTime<Utc>>,
        task_description: String,
    ) -> Option<Role> {
        match self.core.add_role(name, deadline, task_description).await {
            Ok(role) => Some(role),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        }
    }

    pub async fn update_role(&self, role: Role) -> Option<Role> {
        match self.core.update_role(role).await {
            Ok(role) => Some(role),
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                None
            }
        }
    }

    pub async fn remove_role(&self, id: &RoleId) {
        if let Err(e) = self.core.remove_role(id).await {
            log_error_chain(&e, Level::ERROR);
        }
    }
}

impl Drop for RoleSync {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl RoleCore {
    #[tracing::instrument(name = "Resynchronizing role board", skip_all)]
    async fn resync(&self) -> Result<(), SyncError> {
        let roles = self
            .role_store
            .read()
            .await
            .get_roles_for_project(&self.project_id)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;
        self.roles.send_replace(roles);
        Ok(())
    }

    #[tracing::instrument(name = "Adding role", skip_all)]
    async fn add_role(
        &self,
        name: RoleName,
        deadline: Option<DateTime<Utc>>,
        task_description: String,
    ) -> Result<Role, SyncError> {
        let role =
            Role::new(self.project_id, name, deadline, task_description);
        self.role_store
            .write()
            .await
            .add_role(&role)
            .await
            .map_err(|e| SyncError::UnexpectedError(eyre!(e)))?;

        let created = role.clone();
        self.roles.send_modify(|roles| roles.push(created));
        Ok(role)
    }

    #[tracing::instrument(name = "Updating role", skip_all)]
    async fn update_role(&self, role: Role) -> Result<Role, SyncError> {
        self.role_store
            .write()
            .await
            .update_role(&role)
            .await
            .map_err(|e| match e {
                RoleStoreError::RoleIdNotFound => {
                    SyncError::RoleNotFound(*role.role_id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        let updated = role.clone();
        self.roles.send_modify(|roles| {
            if let Some(existing) = roles
                .iter_mut()
                .find(|candidate| candidate.role_id == updated.role_id)
            {
                *existing = updated;
            }
        });
        Ok(role)
    }

    #[tracing::instrument(name = "Removing role", skip_all)]
    async fn remove_role(&self, id: &RoleId) -> Result<(), SyncError> {
        self.role_store
            .write()
            .await
            .delete_role(id)
            .await
            .map_err(|e| match e {
                RoleStoreError::RoleIdNotFound => {
                    SyncError::RoleNotFound(*id.as_ref())
                }
                e => SyncError::UnexpectedError(eyre!(e)),
            })?;

        self.roles
            .send_modify(|roles| roles.retain(|role| role.role_id != *id));
        Ok(())
    }

    #[tracing::instrument(
        name = "Applying remote role change",
        skip_all,
        fields(kind = ?change.kind)
    )]
    async fn apply_remote_change(&self, change: RowChange) {
        if change.originated_by(&self.origin) {
            return;
        }

        match (change.kind, change.role_id) {
            (ChangeKind::Delete, Some(role_id)) => {
                self.roles.send_modify(|roles| {
                    roles.retain(|role| role.role_id != role_id)
                });
            }
            _ => {
                if let Err(e) = self.resync().await {
                    log_error_chain(&e, Level::ERROR);
                }
            }
        }
    }
}

async fn watch_roles(
    core: Arc<RoleCore>,
    subscription: Option<ChangeSubscription>,
) {
    let Some(mut subscription) = subscription else {
        return;
    };
    while let Some(change) = subscription.next().await {
        core.apply_remote_change(change).await;
    }
}
