use color_eyre::eyre::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("Project not found: {0}")]
    ProjectNotFound(uuid::Uuid),
    #[error("Incorrect project password")]
    IncorrectPassword,
    #[error("Not a member of project: {0}")]
    NotAMember(uuid::Uuid),
    #[error("Role not found: {0}")]
    RoleNotFound(uuid::Uuid),
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
    #[error("Validation error")]
    ValidationError(#[from] ValidationError),
}

#[derive(Debug, Error)]
#[error("Validation error: {0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: String) -> Self {
        Self(message)
    }

    pub fn as_ref(&self) -> &String {
        &self.0
    }
}
