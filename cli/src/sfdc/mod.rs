//! Remote platform access
//!
//! The command layer only sees [`Authenticator`] and the [`Session`] it
//! yields; the SOAP plumbing behind it lives in the submodules.

pub mod client;
pub mod login;
pub mod soap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::CommandError;
use crate::payload::CommandPayload;

/// Username/password pair for one org
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub login_url: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            login_url: None,
        }
    }

    pub fn with_login_url(mut self, login_url: Option<String>) -> Self {
        self.login_url = login_url;
        self
    }

    /// Credentials from `username`, `password` and optional `loginUrl`.
    /// Returns `None` when either of the first two is missing or empty.
    pub fn from_payload(payload: &CommandPayload) -> Option<Self> {
        let username = payload.get_str("username")?;
        let password = payload.get_str("password")?;
        let login_url = payload.get_str("loginUrl").map(str::to_string);
        Some(Self::new(username, password).with_login_url(login_url))
    }
}

/// An authenticated remote session
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub instance_url: String,
    pub metadata_url: String,
    pub user_id: Option<String>,
}

/// On-disk form of a [`Session`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub instance_url: String,
    pub metadata_url: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_string(),
            instance_url: session.instance_url.clone(),
            metadata_url: session.metadata_url.clone(),
            user_id: session.user_id.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            instance_url: stored.instance_url,
            metadata_url: stored.metadata_url,
            user_id: stored.user_id,
        }
    }
}

/// Remote authentication client
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a session. A rejected login must surface as
    /// [`CommandError::Authentication`] carrying the upstream text verbatim.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, CommandError>;
}
