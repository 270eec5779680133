use chrono::Utc;
use color_eyre::eyre::eyre;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::domain::{AuthClient, AuthClientError, Email, Session, UserId};

const API_KEY_HEADER: &str = "apikey";

// HTTP client for the backend auth subsystem.
pub struct RestAuthClient {
    base_url: String,
    api_key: Secret<String>,
    http_client: Client,
}

impl RestAuthClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        http_client: Client,
    ) -> Self {
        Self {
            base_url,
            api_key,
            http_client,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Secret<String>,
    refresh_token: Secret<String>,
    expires_in: i64,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    email: String,
}

impl TokenResponse {
    fn into_session(self) -> Result<Session, AuthClientError> {
        let user_id = UserId::parse(&self.user.id)
            .map_err(AuthClientError::UnexpectedError)?;
        let email = Email::parse(Secret::new(self.user.email))
            .map_err(AuthClientError::UnexpectedError)?;
        let lifetime =
            chrono::Duration::try_seconds(self.expires_in).ok_or_else(
                || {
                    AuthClientError::UnexpectedError(eyre!(
                        "invalid session lifetime: {}",
                        self.expires_in
                    ))
                },
            )?;

        Ok(Session::new(
            user_id,
            email,
            self.access_token,
            self.refresh_token,
            Utc::now() + lifetime,
        ))
    }
}

#[async_trait::async_trait]
impl AuthClient for RestAuthClient {
    #[tracing::instrument(name = "Refreshing session", skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &Secret<String>,
    ) -> Result<Session, AuthClientError> {
        let response = self
            .http_client
            .post(format!("{}/token?grant_type=refresh_token", self.base_url))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&serde_json::json!({
                "refresh_token": refresh_token.expose_secret()
            }))
            .send()
            .await
            .map_err(|e| AuthClientError::UnexpectedError(eyre!(e)))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(AuthClientError::SessionExpired)
            }
            status => {
                return Err(AuthClientError::UnexpectedError(eyre!(
                    "auth service returned {status}"
                )))
            }
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthClientError::UnexpectedError(eyre!(e)))?
            .into_session()
    }

    #[tracing::instrument(name = "Signing out", skip_all)]
    async fn sign_out(
        &self,
        access_token: &Secret<String>,
    ) -> Result<(), AuthClientError> {
        let response = self
            .http_client
            .post(format!("{}/logout", self.base_url))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .map_err(|e| AuthClientError::UnexpectedError(eyre!(e)))?;

        // The backend treats revoking an already-dead token as a no-op.
        if response.status().is_success()
            || response.status() == StatusCode::UNAUTHORIZED
        {
            Ok(())
        } else {
            Err(AuthClientError::UnexpectedError(eyre!(
                "auth service returned {}",
                response.status()
            )))
        }
    }
}
