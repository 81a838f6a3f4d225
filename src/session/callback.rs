// src/session/callback.rs
//! OAuth return leg.
//!
//! A backend trigger creates the profile row for new OAuth identities, but
//! only eventually. Instead of sleeping a fixed amount and hoping, the
//! handler polls for the row under a deadline, falls back to creating it
//! client-side, and confirms the row is visible before sending the user to
//! the home route. Every failure path lands on the login route; none of
//! these errors are shown to the user.

use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info};

use crate::backend::{AuthApi, AuthUser, ProfileApi};
use crate::common::helpers::derived_username;
use crate::common::Error;
use crate::profiles::{NewProfile, Profile};

/// Where the callback page should navigate next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Home,
    Login,
}

#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// Delay between profile polls
    pub poll_interval: Duration,
    /// How long to keep polling before giving up on the backend trigger
    pub poll_deadline: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            poll_deadline: Duration::from_secs(5),
        }
    }
}

/// Handle a landing on the OAuth callback route.
pub async fn handle_auth_callback(
    auth: Arc<dyn AuthApi>,
    profiles: Arc<dyn ProfileApi>,
    config: CallbackConfig,
) -> CallbackOutcome {
    let session = match auth.get_session().await {
        Ok(Some(session)) => session,
        Ok(None) => {
            debug!("No session on auth callback, redirecting to login");
            return CallbackOutcome::Login;
        }
        Err(e) => {
            error!(error = %e, "Auth callback error");
            return CallbackOutcome::Login;
        }
    };

    match ensure_profile(profiles, &session.user, &config).await {
        Ok(_) => CallbackOutcome::Home,
        Err(e) => {
            error!(user_id = %session.user.id, error = %e, "Error handling auth callback");
            CallbackOutcome::Login
        }
    }
}

/// Wait for the trigger-created profile; create it ourselves if it never
/// shows up, then confirm the row is actually readable.
async fn ensure_profile(
    profiles: Arc<dyn ProfileApi>,
    user: &AuthUser,
    config: &CallbackConfig,
) -> Result<Profile, Error> {
    if let Some(profile) = poll_for_profile(&profiles, &user.id, config).await? {
        return Ok(profile);
    }

    let username = derived_username(&user.id, user.user_metadata.name.as_deref());
    info!(user_id = %user.id, username = %username, "Trigger did not create profile, upserting");
    let row = NewProfile::new(&user.id, username)
        .with_avatar(user.user_metadata.avatar_url.clone());
    profiles.upsert_profile(&row).await?;

    // Settle: the row must be visible on the read path before we navigate.
    match poll_for_profile(&profiles, &user.id, config).await? {
        Some(profile) => Ok(profile),
        None => Err(Error::ProfileCreationFailed),
    }
}

async fn poll_for_profile(
    profiles: &Arc<dyn ProfileApi>,
    user_id: &str,
    config: &CallbackConfig,
) -> Result<Option<Profile>, Error> {
    let deadline = Instant::now() + config.poll_deadline;
    loop {
        if let Some(profile) = profiles.get_profile(user_id).await? {
            return Ok(Some(profile));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(config.poll_interval).await;
    }
}
