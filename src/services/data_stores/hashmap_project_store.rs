use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::BroadcastChangeFeed;
use crate::domain::{
    ChangeKind, Membership, OriginId, Project, ProjectId, ProjectPassword,
    ProjectStore, ProjectStoreError, Relation, RowChange, UserId,
};

#[derive(Default)]
struct ProjectTables {
    projects: HashMap<Uuid, Project>,
    memberships: HashMap<(Uuid, Uuid), Membership>,
}

impl ProjectTables {
    fn with_member_count(&self, project: &Project) -> Project {
        let mut counted = project.clone();
        counted.member_count = self
            .memberships
            .keys()
            .filter(|(project_id, _)| project_id == project.project_id.as_ref())
            .count() as i64;
        counted
    }
}

// In-memory stand-in for the backend's `projects` and `project_members`
// relations. Handles created with `handle` share the same tables, so a test
// can mutate them as a second client with its own origin.
#[derive(Clone, Default)]
pub struct HashmapProjectStore {
    tables: Arc<Mutex<ProjectTables>>,
    feed: Option<BroadcastChangeFeed>,
    origin: Option<OriginId>,
}

impl HashmapProjectStore {
    pub fn with_feed(feed: BroadcastChangeFeed, origin: OriginId) -> Self {
        Self {
            tables: Arc::default(),
            feed: Some(feed),
            origin: Some(origin),
        }
    }

    pub fn handle(&self, origin: Option<OriginId>) -> Self {
        Self {
            tables: self.tables.clone(),
            feed: self.feed.clone(),
            origin,
        }
    }

    fn publish(
        &self,
        relation: Relation,
        kind: ChangeKind,
        project_id: ProjectId,
        user_id: Option<UserId>,
    ) {
        if let Some(feed) = &self.feed {
            feed.publish(RowChange {
                relation,
                kind,
                project_id,
                user_id,
                role_id: None,
                origin: self.origin,
            });
        }
    }
}

#[async_trait::async_trait]
impl ProjectStore for HashmapProjectStore {
    async fn get_owned_projects(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, ProjectStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .projects
            .values()
            .filter(|project| project.owner_id == *owner)
            .map(|project| tables.with_member_count(project))
            .collect())
    }

    async fn get_joined_project_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<ProjectId>, ProjectStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .memberships
            .values()
            .filter(|membership| membership.user_id == *user)
            .map(|membership| membership.project_id)
            .collect())
    }

    async fn get_projects(
        &self,
        ids: &[ProjectId],
    ) -> Result<Vec<Project>, ProjectStoreError> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.projects.get(id.as_ref()))
            .map(|project| tables.with_member_count(project))
            .collect())
    }

    async fn get_project(
        &self,
        id: &ProjectId,
    ) -> Result<Project, ProjectStoreError> {
        let tables = self.tables.lock().await;
        tables
            .projects
            .get(id.as_ref())
            .map(|project| tables.with_member_count(project))
            .ok_or(ProjectStoreError::ProjectIdNotFound)
    }

    async fn add_project(
        &mut self,
        project: &Project,
    ) -> Result<(), ProjectStoreError> {
        let mut tables = self.tables.lock().await;
        if tables.projects.contains_key(project.project_id.as_ref()) {
            return Err(ProjectStoreError::ProjectIdExists);
        }
        tables
            .projects
            .insert(*project.project_id.as_ref(), project.clone());
        drop(tables);

        self.publish(
            Relation::Projects,
            ChangeKind::Insert,
            project.project_id,
            Some(project.owner_id),
        );
        Ok(())
    }

    async fn delete_project(
        &mut self,
        id: &ProjectId,
    ) -> Result<(), ProjectStoreError> {
        let mut tables = self.tables.lock().await;
        let project = tables
            .projects
            .remove(id.as_ref())
            .ok_or(ProjectStoreError::ProjectIdNotFound)?;

        // Cascade, as the backend schema does.
        let removed: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|membership| membership.project_id == *id)
            .cloned()
            .collect();
        tables
            .memberships
            .retain(|(project_id, _), _| project_id != id.as_ref());
        drop(tables);

        self.publish(
            Relation::Projects,
            ChangeKind::Delete,
            *id,
            Some(project.owner_id),
        );
        for membership in removed {
            self.publish(
                Relation::ProjectMembers,
                ChangeKind::Delete,
                *id,
                Some(membership.user_id),
            );
        }
        Ok(())
    }

    async fn verify_password(
        &self,
        id: &ProjectId,
        candidate: &ProjectPassword,
    ) -> Result<bool, ProjectStoreError> {
        let tables = self.tables.lock().await;
        let project = tables
            .projects
            .get(id.as_ref())
            .ok_or(ProjectStoreError::ProjectIdNotFound)?;
        Ok(match &project.password {
            Some(password) => password == candidate,
            None => true,
        })
    }

    async fn get_members(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Membership>, ProjectStoreError> {
        let tables = self.tables.lock().await;
        if !tables.projects.contains_key(project.as_ref()) {
            return Err(ProjectStoreError::ProjectIdNotFound);
        }
        Ok(tables
            .memberships
            .values()
            .filter(|membership| membership.project_id == *project)
            .cloned()
            .collect())
    }

    async fn upsert_membership(
        &mut self,
        membership: &Membership,
    ) -> Result<(), ProjectStoreError> {
        let mut tables = self.tables.lock().await;
        if !tables
            .projects
            .contains_key(membership.project_id.as_ref())
        {
            return Err(ProjectStoreError::ProjectIdNotFound);
        }

        let key = (
            *membership.project_id.as_ref(),
            *membership.user_id.as_ref(),
        );
        let previous = tables.memberships.insert(key, membership.clone());
        drop(tables);

        match previous {
            Some(existing) if existing == *membership => {}
            Some(_) => self.publish(
                Relation::ProjectMembers,
                ChangeKind::Update,
                membership.project_id,
                Some(membership.user_id),
            ),
            None => self.publish(
                Relation::ProjectMembers,
                ChangeKind::Insert,
                membership.project_id,
                Some(membership.user_id),
            ),
        }
        Ok(())
    }

    async fn remove_membership(
        &mut self,
        project: &ProjectId,
        user: &UserId,
    ) -> Result<(), ProjectStoreError> {
        let mut tables = self.tables.lock().await;
        tables
            .memberships
            .remove(&(*project.as_ref(), *user.as_ref()))
            .ok_or(ProjectStoreError::MembershipNotFound)?;
        drop(tables);

        self.publish(
            Relation::ProjectMembers,
            ChangeKind::Delete,
            *project,
            Some(*user),
        );
        Ok(())
    }
}
