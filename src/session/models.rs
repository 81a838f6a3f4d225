// src/session/models.rs

use serde::Serialize;

use crate::backend::AuthUser;
use crate::profiles::Profile;

/// Lifecycle of one browser tab's session view.
///
/// `Uninitialized -> Loading -> {Authenticated, Anonymous}`; after that the
/// machine moves between the last two for the lifetime of the page. The
/// profile can be absent while authenticated: profile creation failed but
/// the identity is still valid.
#[derive(Debug, Clone, Serialize)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated {
        user: AuthUser,
        profile: Option<Profile>,
    },
    Anonymous,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }
}
