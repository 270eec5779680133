use super::{
    Membership, Profile, Project, ProjectId, ProjectPassword, Role, RoleId,
    UserId,
};
use color_eyre::eyre::Report;
use thiserror::Error;

#[async_trait::async_trait]
pub trait ProjectStore {
    async fn get_owned_projects(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Project>, ProjectStoreError>;
    async fn get_joined_project_ids(
        &self,
        user: &UserId,
    ) -> Result<Vec<ProjectId>, ProjectStoreError>;
    async fn get_projects(
        &self,
        ids: &[ProjectId],
    ) -> Result<Vec<Project>, ProjectStoreError>;
    async fn get_project(
        &self,
        id: &ProjectId,
    ) -> Result<Project, ProjectStoreError>;
    async fn add_project(
        &mut self,
        project: &Project,
    ) -> Result<(), ProjectStoreError>;
    async fn delete_project(
        &mut self,
        id: &ProjectId,
    ) -> Result<(), ProjectStoreError>;
    async fn verify_password(
        &self,
        id: &ProjectId,
        candidate: &ProjectPassword,
    ) -> Result<bool, ProjectStoreError>;
    async fn get_members(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Membership>, ProjectStoreError>;
    async fn upsert_membership(
        &mut self,
        membership: &Membership,
    ) -> Result<(), ProjectStoreError>;
    async fn remove_membership(
        &mut self,
        project: &ProjectId,
        user: &UserId,
    ) -> Result<(), ProjectStoreError>;
}

#[derive(Debug, Error)]
pub enum ProjectStoreError {
    #[error("Project ID exists")]
    ProjectIdExists,
    #[error("Project ID not found")]
    ProjectIdNotFound,
    #[error("Membership not found")]
    MembershipNotFound,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for ProjectStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::ProjectIdExists, Self::ProjectIdExists)
                | (Self::ProjectIdNotFound, Self::ProjectIdNotFound)
                | (Self::MembershipNotFound, Self::MembershipNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait::async_trait]
pub trait RoleStore {
    async fn get_roles_for_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Role>, RoleStoreError>;
    async fn add_role(&mut self, role: &Role) -> Result<(), RoleStoreError>;
    async fn update_role(&mut self, role: &Role)
        -> Result<(), RoleStoreError>;
    async fn delete_role(&mut self, id: &RoleId)
        -> Result<(), RoleStoreError>;
}

#[derive(Debug, Error)]
pub enum RoleStoreError {
    #[error("Role ID not found")]
    RoleIdNotFound,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for RoleStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::RoleIdNotFound, Self::RoleIdNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

#[async_trait::async_trait]
pub trait ProfileStore {
    async fn get_profile(
        &self,
        user: &UserId,
    ) -> Result<Profile, ProfileStoreError>;
    async fn get_profiles(
        &self,
        users: &[UserId],
    ) -> Result<Vec<Profile>, ProfileStoreError>;
    async fn upsert_profile(
        &mut self,
        profile: &Profile,
    ) -> Result<(), ProfileStoreError>;
}

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("Profile not found")]
    ProfileNotFound,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for ProfileStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::ProfileNotFound, Self::ProfileNotFound)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}
