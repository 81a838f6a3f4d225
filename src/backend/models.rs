// src/backend/models.rs
//! Auth provider data models and wire types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata the auth provider attaches to an identity.
/// OAuth providers fill `name`/`avatar_url`; our sign-up flow stores the
/// chosen `username` here as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// An authenticated identity as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// A cached copy of the provider-issued session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of `access_token`
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// True when the access token expires within `window` from now
    pub fn expires_within(&self, window: Duration) -> bool {
        self.expires_at - Utc::now() < window
    }
}

/// Result of a sign-up call. Providers configured with email confirmation
/// create the identity but withhold the session until the address is
/// confirmed, so the session is optional.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

/// Raw token-endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp; some deployments only send `expires_in`
    pub expires_at: Option<i64>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn into_session(self) -> AuthSession {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(ts), _) => DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now),
            (None, Some(secs)) => Utc::now() + Duration::seconds(secs),
            (None, None) => Utc::now() + Duration::hours(1),
        };
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Raw sign-up response: the identity, plus the token fields when the
/// provider issues a session immediately
#[derive(Debug, Deserialize)]
pub(crate) struct SignUpResponse {
    pub user: Option<AuthUser>,
    pub id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
    pub expires_in: Option<i64>,
}
