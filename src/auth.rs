//! Session tokens for the mind map library.
//!
//! Tokens are opaque random strings mapped to a user on the server side.
//! Nothing about the user is encoded in the token itself.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identifier of a library user.
pub type UserId = Uuid;

/// How long an issued session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("not signed in")]
    Unauthorized,
    #[error("session expired")]
    Expired,
}

/// An opaque bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Resolves a token to the user it was issued for.
pub trait Authenticator: Send {
    fn authenticate(&self, token: &SessionToken) -> Result<UserId, AuthError>;
}

#[derive(Debug, Clone)]
struct Session {
    user: UserId,
    expires_at: DateTime<Utc>,
}

/// In-process session table.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: HashMap<SessionToken, Session>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(SESSION_TTL_DAYS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Starts a session for `user`.
    pub fn issue(&mut self, user: UserId) -> SessionToken {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&mut self, user: UserId, now: DateTime<Utc>) -> SessionToken {
        let token = SessionToken(Uuid::new_v4().to_string());
        self.sessions.insert(
            token.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );
        debug!("issued session for {user}");
        token
    }

    /// Ends a session. Returns false if the token was unknown.
    pub fn revoke(&mut self, token: &SessionToken) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn authenticate_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<UserId, AuthError> {
        let session = self.sessions.get(token).ok_or(AuthError::Unauthorized)?;
        if now >= session.expires_at {
            return Err(AuthError::Expired);
        }
        Ok(session.user)
    }

    /// Drops every expired session.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.sessions.retain(|_, s| now < s.expires_at);
    }
}

impl Authenticator for SessionStore {
    fn authenticate(&self, token: &SessionToken) -> Result<UserId, AuthError> {
        self.authenticate_at(token, Utc::now())
    }
}
