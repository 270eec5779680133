use color_eyre::eyre::{eyre, Result};
use secrecy::{ExposeSecret, Secret};

// Join password for a private project. Verified server-side; the client
// only checks that a candidate is well-formed before sending it.
#[derive(Debug, Clone)]
pub struct ProjectPassword(Secret<String>);

impl ProjectPassword {
    pub fn parse(s: Secret<String>) -> Result<Self> {
        match s.expose_secret().chars().count() {
            x if x < 4 => Err(eyre!("Password must be at least 4 characters")),
            x if x > 64 => Err(eyre!("Max password length is 64 characters")),
            _ => Ok(Self(s)),
        }
    }
}

impl PartialEq for ProjectPassword {
    fn eq(&self, other: &Self) -> bool {
        self.0.expose_secret() == other.0.expose_secret()
    }
}

impl AsRef<Secret<String>> for ProjectPassword {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}
