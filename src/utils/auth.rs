use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::{Session, UserId};

// How close to expiry an access token may get before it counts as stale
pub const SESSION_REFRESH_LEEWAY_SECONDS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// The client holds no signing secret, so claims are decoded without
// verifying the signature. The backend stays the authority on validity.
#[tracing::instrument(name = "Decoding session claims", skip_all)]
pub fn decode_session_claims(
    access_token: &Secret<String>,
) -> Result<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    decode::<Claims>(
        access_token.expose_secret(),
        &DecodingKey::from_secret(&[]),
        &validation,
    )
    .map(|data| data.claims)
    .wrap_err("failed to decode access token")
}

pub fn token_user_id(access_token: &Secret<String>) -> Result<UserId> {
    let claims = decode_session_claims(access_token)?;
    UserId::parse(&claims.sub)
}

// True when the access token lapses within the leeway window. Falls back
// to the session's own expiry when the token is not a decodable JWT.
pub fn expires_within(session: &Session, leeway_seconds: i64) -> bool {
    let expiry = decode_session_claims(&session.access_token)
        .ok()
        .and_then(|claims| {
            DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
        })
        .unwrap_or(session.expires_at);
    let leeway = chrono::Duration::try_seconds(leeway_seconds)
        .unwrap_or_else(chrono::Duration::zero);

    expiry <= Utc::now() + leeway
}
