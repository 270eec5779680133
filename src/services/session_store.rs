use secrecy::Secret;
use tokio::sync::watch;
use tracing::Level;

use crate::app_state::AuthClientType;
use crate::domain::{Session, UserId};
use crate::utils::auth::{expires_within, SESSION_REFRESH_LEEWAY_SECONDS};
use crate::utils::tracing::log_error_chain;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl SessionState {
    pub fn user_id(&self) -> Option<UserId> {
        self.session.as_ref().map(|session| session.user_id)
    }
}

// Holds the current auth session and notifies dependents when it changes.
// Sign-in itself happens outside this crate; a session arrives here either
// via `set_session` or by restoring a persisted refresh token.
pub struct SessionStore {
    auth_client: AuthClientType,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(auth_client: AuthClientType) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { auth_client, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.state.borrow().user_id()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn set_session(&self, session: Session) {
        self.state.send_replace(SessionState {
            session: Some(session),
            loading: false,
        });
    }

    pub fn clear(&self) {
        self.state.send_replace(SessionState::default());
    }

    #[tracing::instrument(name = "Restoring session", skip_all)]
    pub async fn restore(
        &self,
        refresh_token: Secret<String>,
    ) -> Option<Session> {
        self.state.send_modify(|state| state.loading = true);

        match self.auth_client.refresh_session(&refresh_token).await {
            Ok(session) => {
                self.state.send_replace(SessionState {
                    session: Some(session.clone()),
                    loading: false,
                });
                Some(session)
            }
            Err(e) => {
                log_error_chain(&e, Level::ERROR);
                self.state.send_replace(SessionState::default());
                None
            }
        }
    }

    // Exchange the refresh token again when the access token is about to
    // lapse; otherwise hand back the session as-is.
    pub async fn refresh_if_stale(&self) -> Option<Session> {
        let session = self.current()?;
        if !expires_within(&session, SESSION_REFRESH_LEEWAY_SECONDS) {
            return Some(session);
        }
        self.restore(session.refresh_token.clone()).await
    }

    #[tracing::instrument(name = "Signing out", skip_all)]
    pub async fn sign_out(&self) {
        if let Some(session) = self.current() {
            if let Err(e) =
                self.auth_client.sign_out(&session.access_token).await
            {
                log_error_chain(&e, Level::ERROR);
            }
        }
        self.clear();
    }
}
