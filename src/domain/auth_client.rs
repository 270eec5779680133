use color_eyre::eyre::Report;
use secrecy::Secret;
use thiserror::Error;

use super::Session;

// The backend auth subsystem, as far as the client needs it: exchanging a
// refresh token for a fresh session and revoking one on sign-out.
// Interactive sign-in lives outside this crate.
#[async_trait::async_trait]
pub trait AuthClient {
    async fn refresh_session(
        &self,
        refresh_token: &Secret<String>,
    ) -> Result<Session, AuthClientError>;
    async fn sign_out(
        &self,
        access_token: &Secret<String>,
    ) -> Result<(), AuthClientError>;
}

#[derive(Debug, Error)]
pub enum AuthClientError {
    #[error("Session expired")]
    SessionExpired,
    #[error("Unexpected error")]
    UnexpectedError(#[source] Report),
}

impl PartialEq for AuthClientError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::SessionExpired, Self::SessionExpired)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}
