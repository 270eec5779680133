use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};

use super::{Email, UserId};

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: Email,
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: UserId,
        email: Email,
        access_token: Secret<String>,
        refresh_token: Secret<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            email,
            access_token,
            refresh_token,
            expires_at,
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.access_token.expose_secret()
                == other.access_token.expose_secret()
    }
}
