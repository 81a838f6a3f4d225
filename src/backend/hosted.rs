// src/backend/hosted.rs
//! HTTP implementation of the backend traits.
//!
//! The hosted service exposes three URL families:
//! - `/auth/v1/*` for the auth provider
//! - `/rest/v1/{table}` for row-level CRUD with equality filters
//! - `/storage/v1/object/*` for file storage
//!
//! The client keeps a local copy of the issued session, the same way the
//! vendor's browser SDK does, so table calls can authenticate with the
//! user's token and fall back to the anon key otherwise.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::common::{BackendConfig, Error};
use crate::profiles::{NewProfile, Profile, ProfileChanges};
use crate::videos::{Gallery, NewVideo, TagGroup, Video, VideoChanges};

use super::api::{AuthApi, GalleryApi, ProfileApi, StorageApi};
use super::models::{
    AuthSession, SignUpOutcome, SignUpResponse, TokenResponse, UserMetadata,
};

#[derive(Clone)]
pub struct HostedBackend {
    config: BackendConfig,
    http: Client,
    session: Arc<RwLock<Option<AuthSession>>>,
}

impl HostedBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Seed the cached session, e.g. one restored from persistent storage
    /// by the embedding shell.
    pub async fn restore_session(&self, session: AuthSession) {
        *self.session.write().await = Some(session);
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    async fn bearer_token(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.anon_key.clone(),
        }
    }

    /// Common headers for table calls: the anon api key plus the strongest
    /// bearer we currently hold.
    async fn rest_request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.bearer_token().await)
    }

    /// Turn a non-success response into an [`Error`], logging the raw body
    async fn response_error(resp: Response) -> Error {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or(body);
        warn!(http_status = %status, message = %message, "Backend returned error status");
        Error::from_provider_message(status.as_u16(), message)
    }

    async fn json_or_error<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
        if resp.status().is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            Err(Self::response_error(resp).await)
        }
    }

    /// At-most-one row matching an equality filter
    async fn select_maybe_single<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<T>, Error> {
        let url = format!(
            "{}?{}=eq.{}&select=*&limit=1",
            self.rest_url(table),
            column,
            urlencoding::encode(value)
        );
        debug!(table = %table, column = %column, "Selecting single row");
        let resp = self.rest_request(self.http.get(&url)).await.send().await?;
        let rows: Vec<T> = Self::json_or_error(resp).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return its representation
    async fn insert_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        prefer: &str,
        query: &str,
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.rest_url(table), query);
        let resp = self
            .rest_request(self.http.post(&url))
            .await
            .header("Prefer", prefer)
            .json(&[body])
            .send()
            .await?;
        let rows: Vec<T> = Self::json_or_error(resp).await?;
        rows.into_iter().next().ok_or(Error::Backend {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: format!("insert into {} returned no representation", table),
        })
    }
}

// ============================================================================
// AuthApi
// ============================================================================

#[async_trait]
impl AuthApi for HostedBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, Error> {
        debug!(email = %crate::common::safe_email_log(email), "Password sign-in");
        let resp = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = Self::json_or_error(resp).await?;
        let session = token.into_session();
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<SignUpOutcome, Error> {
        debug!(email = %crate::common::safe_email_log(email), "Sign-up");
        let resp = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": &metadata,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let err = Self::response_error(resp).await;
            return Err(match err {
                Error::Backend { status, message } if status < 500 => {
                    Error::SignupRejected(message)
                }
                other => other,
            });
        }

        let raw: SignUpResponse = resp.json().await?;
        let user = raw
            .user
            .clone()
            .or_else(|| {
                raw.id.clone().map(|id| super::models::AuthUser {
                    id,
                    email: Some(email.to_string()),
                    user_metadata: metadata.clone(),
                })
            })
            .ok_or(Error::Backend {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: "sign-up response carried no user".to_string(),
            })?;

        let session = match (raw.access_token, raw.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Some(
                TokenResponse {
                    access_token,
                    refresh_token,
                    expires_at: raw.expires_at,
                    expires_in: raw.expires_in,
                    user: user.clone(),
                }
                .into_session(),
            ),
            _ => None,
        };

        if let Some(ref session) = session {
            *self.session.write().await = Some(session.clone());
        }

        Ok(SignUpOutcome { user, session })
    }

    async fn sign_out(&self) -> Result<(), Error> {
        // Drop the local copy first so the client is signed out even when the
        // revocation call fails; the error is still reported to the caller.
        let old = self.session.write().await.take();
        let Some(session) = old else { return Ok(()) };

        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(resp).await)
        }
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, Error> {
        Ok(self.session.read().await.clone())
    }

    async fn refresh_session(&self) -> Result<AuthSession, Error> {
        let refresh_token = match self.session.read().await.as_ref() {
            Some(session) => session.refresh_token.clone(),
            None => return Err(Error::NotAuthenticated),
        };

        let resp = self
            .http
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let token: TokenResponse = Self::json_or_error(resp).await.map_err(|e| {
            error!(error = %e, "Session refresh failed");
            e
        })?;
        let session = token.into_session();
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    async fn update_password(&self, new_password: &str) -> Result<(), Error> {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => return Err(Error::NotAuthenticated),
        };
        let resp = self
            .http
            .put(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(resp).await)
        }
    }

    async fn admin_delete_user(&self, user_id: &str) -> Result<(), Error> {
        let Some(service_key) = self.config.service_role_key.as_ref() else {
            return Err(Error::Backend {
                status: StatusCode::FORBIDDEN.as_u16(),
                message: "service role key not configured".to_string(),
            });
        };
        let resp = self
            .http
            .delete(self.auth_url(&format!("admin/users/{}", user_id)))
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(resp).await)
        }
    }

    fn authorize_url(&self, provider: &str) -> String {
        format!(
            "{}?provider={}&redirect_to={}",
            self.auth_url("authorize"),
            provider,
            urlencoding::encode(&self.config.oauth_redirect_url)
        )
    }
}

// ============================================================================
// ProfileApi
// ============================================================================

#[async_trait]
impl ProfileApi for HostedBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, Error> {
        self.select_maybe_single("profiles", "id", user_id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, Error> {
        self.select_maybe_single("profiles", "username", username)
            .await
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, Error> {
        self.insert_returning("profiles", profile, "return=representation", "")
            .await
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile, Error> {
        self.insert_returning(
            "profiles",
            profile,
            "resolution=merge-duplicates,return=representation",
            "?on_conflict=id",
        )
        .await
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Profile, Error> {
        let url = format!("{}?id=eq.{}", self.rest_url("profiles"), user_id);
        let resp = self
            .rest_request(self.http.patch(&url))
            .await
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        let rows: Vec<Profile> = Self::json_or_error(resp).await?;
        rows.into_iter().next().ok_or(Error::Backend {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: format!("no profile row for id {}", user_id),
        })
    }
}

// ============================================================================
// GalleryApi
// ============================================================================

#[async_trait]
impl GalleryApi for HostedBackend {
    async fn get_gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, Error> {
        self.select_maybe_single("galleries", "id", gallery_id).await
    }

    async fn list_tag_groups(&self, gallery_id: &str) -> Result<Vec<TagGroup>, Error> {
        let url = format!(
            "{}?gallery_id=eq.{}&select=*&order=name.asc",
            self.rest_url("tag_groups"),
            gallery_id
        );
        let resp = self.rest_request(self.http.get(&url)).await.send().await?;
        Self::json_or_error(resp).await
    }

    async fn list_videos(&self, gallery_id: &str) -> Result<Vec<Video>, Error> {
        let url = format!(
            "{}?gallery_id=eq.{}&select=*&order=created_at.desc",
            self.rest_url("videos"),
            gallery_id
        );
        let resp = self.rest_request(self.http.get(&url)).await.send().await?;
        Self::json_or_error(resp).await
    }

    async fn insert_video(&self, video: &NewVideo) -> Result<Video, Error> {
        self.insert_returning("videos", video, "return=representation", "")
            .await
    }

    async fn update_video(
        &self,
        video_id: &str,
        changes: &VideoChanges,
    ) -> Result<Video, Error> {
        let url = format!("{}?id=eq.{}", self.rest_url("videos"), video_id);
        let resp = self
            .rest_request(self.http.patch(&url))
            .await
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        let rows: Vec<Video> = Self::json_or_error(resp).await?;
        rows.into_iter().next().ok_or(Error::Backend {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: format!("no video row for id {}", video_id),
        })
    }

    async fn delete_video(&self, video_id: &str) -> Result<(), Error> {
        let url = format!("{}?id=eq.{}", self.rest_url("videos"), video_id);
        let resp = self.rest_request(self.http.delete(&url)).await.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(resp).await)
        }
    }
}

// ============================================================================
// StorageApi
// ============================================================================

#[async_trait]
impl StorageApi for HostedBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Error> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, bucket, path
        );
        debug!(bucket = %bucket, path = %path, size = bytes.len(), "Uploading object");
        let resp = self
            .rest_request(self.http.post(&url))
            .await
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(resp).await)
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, bucket, path
        )
    }
}
