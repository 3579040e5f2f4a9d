//! Session credentials

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session bundle.
///
/// Immutable once built: a refresh produces a new value instead of
/// mutating this one. A non-empty `token` means the bundle came from a
/// successful sign-in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    auth_hash: String,
    user: String,
    user_id: String,
    token: String,
    obtained_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        auth_hash: impl Into<String>,
        user: impl Into<String>,
        user_id: impl Into<String>,
        token: impl Into<String>,
        obtained_at: DateTime<Utc>,
    ) -> Self {
        Self {
            auth_hash: auth_hash.into(),
            user: user.into(),
            user_id: user_id.into(),
            token: token.into(),
            obtained_at,
        }
    }

    pub fn auth_hash(&self) -> &str {
        &self.auth_hash
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("user_id", &self.user_id)
            .field("has_token", &self.has_token())
            .field("obtained_at", &self.obtained_at)
            .finish_non_exhaustive()
    }
}

/// Success payload of both sign-in endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "service_authhash", default)]
    pub auth_hash: String,
    #[serde(rename = "guid", default)]
    pub user_id: String,
    #[serde(default)]
    pub token: String,
}
