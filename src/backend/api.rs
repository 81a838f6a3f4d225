// src/backend/api.rs
//! Trait seams for the hosted backend.
//!
//! The session manager and data services take these as `Arc<dyn _>` rather
//! than reaching for an ambient global client, so tests can substitute
//! in-memory fakes and embedders can wire in whatever transport they need.

use async_trait::async_trait;

use crate::common::Error;
use crate::profiles::{NewProfile, Profile, ProfileChanges};
use crate::videos::{Gallery, NewVideo, TagGroup, Video, VideoChanges};

use super::models::{AuthSession, SignUpOutcome, UserMetadata};

/// Auth provider operations
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Credential sign-in; the implementation stores the issued session
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<AuthSession, Error>;

    /// Create a new identity. Session is absent when the provider requires
    /// email confirmation first.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<SignUpOutcome, Error>;

    /// Revoke the current session server-side
    async fn sign_out(&self) -> Result<(), Error>;

    /// Current session, if any
    async fn get_session(&self) -> Result<Option<AuthSession>, Error>;

    /// Exchange the refresh token for a new session
    async fn refresh_session(&self) -> Result<AuthSession, Error>;

    /// Change the authenticated user's password
    async fn update_password(&self, new_password: &str) -> Result<(), Error>;

    /// Delete an identity (privileged; used to compensate a failed sign-up)
    async fn admin_delete_user(&self, user_id: &str) -> Result<(), Error>;

    /// URL the embedder should navigate the page to for an OAuth sign-in
    fn authorize_url(&self, provider: &str) -> String;
}

/// CRUD against the `profiles` table
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// At-most-one lookup by identity id
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, Error>;

    /// At-most-one lookup by username (sign-up availability check)
    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, Error>;

    /// Insert; fails with [`Error::UsernameTaken`] on the uniqueness constraint
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, Error>;

    /// Insert-or-keep on id conflict (callback fallback path)
    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile, Error>;

    /// Patch and return the updated row
    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Profile, Error>;
}

/// CRUD against the gallery tables
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn get_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, Error>;

    async fn list_tag_groups(&self, gallery_id: &str) -> Result<Vec<TagGroup>, Error>;

    async fn list_videos(&self, gallery_id: &str) -> Result<Vec<Video>, Error>;

    async fn insert_video(&self, video: &NewVideo) -> Result<Video, Error>;

    async fn update_video(&self, video_id: &str, changes: &VideoChanges)
        -> Result<Video, Error>;

    async fn delete_video(&self, video_id: &str) -> Result<(), Error>;
}

/// File storage operations
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Error>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
