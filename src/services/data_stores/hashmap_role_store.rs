use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::BroadcastChangeFeed;
use crate::domain::{
    ChangeKind, OriginId, ProjectId, Relation, Role, RoleId, RoleStore,
    RoleStoreError, RowChange,
};

// In-memory stand-in for the backend's `roles` relation.
#[derive(Clone, Default)]
pub struct HashmapRoleStore {
    roles: Arc<Mutex<HashMap<Uuid, Role>>>,
    feed: Option<BroadcastChangeFeed>,
    origin: Option<OriginId>,
}

impl HashmapRoleStore {
    pub fn with_feed(feed: BroadcastChangeFeed, origin: OriginId) -> Self {
        Self {
            roles: Arc::default(),
            feed: Some(feed),
            origin: Some(origin),
        }
    }

    pub fn handle(&self, origin: Option<OriginId>) -> Self {
        Self {
            roles: self.roles.clone(),
            feed: self.feed.clone(),
            origin,
        }
    }

    fn publish(&self, kind: ChangeKind, role: &Role) {
        if let Some(feed) = &self.feed {
            feed.publish(RowChange {
                relation: Relation::Roles,
                kind,
                project_id: role.project_id,
                user_id: None,
                role_id: Some(role.role_id),
                origin: self.origin,
            });
        }
    }
}

#[async_trait::async_trait]
impl RoleStore for HashmapRoleStore {
    async fn get_roles_for_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Role>, RoleStoreError> {
        Ok(self
            .roles
            .lock()
            .await
            .values()
            .filter(|role| role.project_id == *project)
            .cloned()
            .collect())
    }

    async fn add_role(&mut self, role: &Role) -> Result<(), RoleStoreError> {
        self.roles
            .lock()
            .await
            .insert(*role.role_id.as_ref(), role.clone());
        self.publish(ChangeKind::Insert, role);
        Ok(())
    }

    async fn update_role(
        &mut self,
        role: &Role,
    ) -> Result<(), RoleStoreError> {
        let mut roles = self.roles.lock().await;
        if !roles.contains_key(role.role_id.as_ref()) {
            return Err(RoleStoreError::RoleIdNotFound);
        }
        roles.insert(*role.role_id.as_ref(), role.clone());
        drop(roles);

        self.publish(ChangeKind::Update, role);
        Ok(())
    }

    async fn delete_role(
        &mut self,
        id: &RoleId,
    ) -> Result<(), RoleStoreError> {
        let removed = self
            .roles
            .lock()
            .await
            .remove(id.as_ref())
            .ok_or(RoleStoreError::RoleIdNotFound)?;
        self.publish(ChangeKind::Delete, &removed);
        Ok(())
    }
}
