// src/profiles/service.rs
//! Profile fetch-or-create and mutation on top of the `profiles` table.
//!
//! Fetches are rate limited per service instance: at most one backend
//! round-trip per window, callers inside the window get the cached copy.
//! The window also guards manual session refresh (the session manager shares
//! this instance), matching the single timestamp the product has always used.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{AuthUser, ProfileApi, StorageApi};
use crate::common::helpers::{derived_username, random_suffix};
use crate::common::Error;

use super::models::{NewProfile, Profile, ProfileChanges};

/// Minimum interval between profile fetch attempts per service instance
pub const PROFILE_FETCH_MIN_INTERVAL: Duration = Duration::from_secs(60);

const AVATAR_BUCKET: &str = "avatars";

#[derive(Debug, Default)]
struct FetchState {
    last_fetch: Option<Instant>,
    cached: Option<Profile>,
}

#[derive(Clone)]
pub struct ProfileService {
    api: Arc<dyn ProfileApi>,
    storage: Arc<dyn StorageApi>,
    min_interval: Duration,
    state: Arc<RwLock<FetchState>>,
}

impl ProfileService {
    pub fn new(api: Arc<dyn ProfileApi>, storage: Arc<dyn StorageApi>) -> Self {
        Self::with_min_interval(api, storage, PROFILE_FETCH_MIN_INTERVAL)
    }

    pub fn with_min_interval(
        api: Arc<dyn ProfileApi>,
        storage: Arc<dyn StorageApi>,
        min_interval: Duration,
    ) -> Self {
        Self {
            api,
            storage,
            min_interval,
            state: Arc::new(RwLock::new(FetchState::default())),
        }
    }

    /// Last profile returned by any operation on this instance
    pub async fn cached(&self) -> Option<Profile> {
        self.state.read().await.cached.clone()
    }

    /// Replace the cached copy (sign-out clears it with `None`)
    pub async fn set_cached(&self, profile: Option<Profile>) {
        self.state.write().await.cached = profile;
    }

    /// True while a recent fetch keeps further attempts rate limited
    pub async fn rate_limited(&self) -> bool {
        self.state
            .read()
            .await
            .last_fetch
            .map(|at| at.elapsed() < self.min_interval)
            .unwrap_or(false)
    }

    /// Fetch the profile for `user`, creating the row on first sign-in.
    ///
    /// Inside the rate-limit window this returns the cached profile without
    /// touching the backend. A username-uniqueness collision on create is
    /// retried once with a randomized suffix; if that also fails the error is
    /// surfaced and the cache stays unset - the identity remains
    /// authenticated without a profile.
    pub async fn fetch_or_create(&self, user: &AuthUser) -> Result<Option<Profile>, Error> {
        {
            let mut state = self.state.write().await;
            if let Some(at) = state.last_fetch {
                if at.elapsed() < self.min_interval {
                    debug!(user_id = %user.id, "Skipping profile fetch due to rate limiting");
                    return Ok(state.cached.clone());
                }
            }
            state.last_fetch = Some(Instant::now());
        }

        debug!(user_id = %user.id, "Fetching profile");
        if let Some(profile) = self.api.get_profile(&user.id).await? {
            self.set_cached(Some(profile.clone())).await;
            return Ok(Some(profile));
        }

        info!(user_id = %user.id, "No profile found, creating new profile");
        let username = derived_username(&user.id, user.user_metadata.name.as_deref());
        let row = NewProfile::new(&user.id, username)
            .with_avatar(user.user_metadata.avatar_url.clone());

        let created = match self.api.insert_profile(&row).await {
            Ok(profile) => profile,
            Err(Error::UsernameTaken) => {
                let retry_username = format!("user_{}", random_suffix());
                warn!(
                    user_id = %user.id,
                    retry_username = %retry_username,
                    "Username collision on profile create, retrying once"
                );
                let retry_row = NewProfile::new(&user.id, retry_username)
                    .with_avatar(user.user_metadata.avatar_url.clone());
                self.api.insert_profile(&retry_row).await.map_err(|e| {
                    warn!(user_id = %user.id, error = %e, "Retry profile create failed");
                    Error::ProfileCreationFailed
                })?
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Profile create failed");
                return Err(Error::ProfileCreationFailed);
            }
        };

        self.set_cached(Some(created.clone())).await;
        Ok(Some(created))
    }

    /// Availability check used before sign-up creates any identity
    pub async fn is_username_taken(&self, username: &str) -> Result<bool, Error> {
        Ok(self.api.find_by_username(username).await?.is_some())
    }

    /// Create the profile row for a fresh sign-up. No collision retry here:
    /// the caller compensates by deleting the identity instead.
    pub async fn create_for_signup(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<Profile, Error> {
        let row = NewProfile::new(user_id, username);
        let profile = self.api.insert_profile(&row).await?;
        self.set_cached(Some(profile.clone())).await;
        Ok(profile)
    }

    /// Patch the profile row and replace the cached copy from the returned
    /// representation
    pub async fn update(
        &self,
        user_id: &str,
        mut changes: ProfileChanges,
    ) -> Result<Profile, Error> {
        changes.updated_at = Some(chrono::Utc::now());
        let profile = self.api.update_profile(user_id, &changes).await?;
        self.set_cached(Some(profile.clone())).await;
        Ok(profile)
    }

    /// Upload an avatar image and return its public URL. The profile row is
    /// not touched; callers follow up with [`ProfileService::update`].
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, Error> {
        let ext = file_name.rsplit('.').next().unwrap_or("bin");
        let content_type = match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        };
        let path = format!("{}-{}.{}", user_id, random_suffix(), ext);
        self.storage
            .upload(AVATAR_BUCKET, &path, bytes, content_type)
            .await?;
        Ok(self.storage.public_url(AVATAR_BUCKET, &path))
    }
}
