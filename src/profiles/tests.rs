//! Tests for profile fetch-or-create, rate limiting and avatar upload

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{AuthUser, ProfileApi, StorageApi, UserMetadata};
use crate::common::Error;

use super::models::{NewProfile, Profile, ProfileChanges};
use super::service::ProfileService;

// ============================================================================
// In-memory fakes
// ============================================================================

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<HashMap<String, Profile>>,
    /// Usernames that collide even though no row holds them (simulates rows
    /// owned by other users)
    reserved_usernames: Mutex<Vec<String>>,
    fail_all_inserts: AtomicBool,
    get_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemoryStore {
    fn profile_from(row: &NewProfile) -> Profile {
        Profile {
            id: row.id.clone(),
            username: row.username.clone(),
            avatar_url: row.avatar_url.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn username_taken(&self, username: &str) -> bool {
        self.reserved_usernames
            .lock()
            .unwrap()
            .iter()
            .any(|u| u == username)
            || self
                .rows
                .lock()
                .unwrap()
                .values()
                .any(|p| p.username == username)
    }
}

#[async_trait]
impl ProfileApi for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, Error> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().get(user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Profile>, Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, Error> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all_inserts.load(Ordering::SeqCst) {
            return Err(Error::Backend {
                status: 500,
                message: "insert disabled".to_string(),
            });
        }
        if self.username_taken(&profile.username) {
            return Err(Error::UsernameTaken);
        }
        let row = Self::profile_from(profile);
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), row.clone());
        Ok(row)
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile, Error> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.get(&profile.id) {
            return Ok(existing.clone());
        }
        let row = Self::profile_from(profile);
        rows.insert(profile.id.clone(), row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<Profile, Error> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(user_id).ok_or(Error::Backend {
            status: 404,
            message: "no profile row".to_string(),
        })?;
        if let Some(username) = &changes.username {
            row.username = username.clone();
        }
        if let Some(avatar_url) = &changes.avatar_url {
            row.avatar_url = Some(avatar_url.clone());
        }
        row.updated_at = changes.updated_at.unwrap_or_else(Utc::now);
        Ok(row.clone())
    }
}

#[derive(Default)]
struct MemoryStorage {
    uploads: Mutex<Vec<(String, String, usize, String)>>,
}

#[async_trait]
impl StorageApi for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Error> {
        self.uploads.lock().unwrap().push((
            bucket.to_string(),
            path.to_string(),
            bytes.len(),
            content_type.to_string(),
        ));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://cdn.test/{}/{}", bucket, path)
    }
}

fn user(id: &str, name: Option<&str>) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some("a@x.com".to_string()),
        user_metadata: UserMetadata {
            name: name.map(str::to_string),
            avatar_url: None,
            username: None,
        },
    }
}

fn service(store: &Arc<MemoryStore>) -> ProfileService {
    ProfileService::new(store.clone(), Arc::new(MemoryStorage::default()))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_or_create_creates_exactly_one_row() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);

    let profile = service.fetch_or_create(&user).await.unwrap().unwrap();
    assert_eq!(profile.id, user.id);
    assert_eq!(profile.username, "user_550e8400");
    assert_eq!(store.rows.lock().unwrap().len(), 1);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_call_within_window_returns_cache_without_io() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);

    let first = service.fetch_or_create(&user).await.unwrap().unwrap();
    let reads_after_first = store.get_calls.load(Ordering::SeqCst);
    let writes_after_first = store.insert_calls.load(Ordering::SeqCst);

    let second = service.fetch_or_create(&user).await.unwrap().unwrap();
    assert_eq!(second.username, first.username);
    assert_eq!(store.get_calls.load(Ordering::SeqCst), reads_after_first);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), writes_after_first);
}

#[tokio::test]
async fn test_expired_window_fetches_again() {
    let store = Arc::new(MemoryStore::default());
    let service = ProfileService::with_min_interval(
        store.clone(),
        Arc::new(MemoryStorage::default()),
        Duration::ZERO,
    );
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);

    service.fetch_or_create(&user).await.unwrap();
    service.fetch_or_create(&user).await.unwrap();
    assert_eq!(store.get_calls.load(Ordering::SeqCst), 2);
    // The row already exists the second time around.
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_username_derived_from_display_name() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", Some("Alice Smith"));

    let profile = service.fetch_or_create(&user).await.unwrap().unwrap();
    assert_eq!(profile.username, "alice_smith");
}

#[tokio::test]
async fn test_collision_retries_once_with_random_suffix() {
    let store = Arc::new(MemoryStore::default());
    store
        .reserved_usernames
        .lock()
        .unwrap()
        .push("user_550e8400".to_string());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);

    let profile = service.fetch_or_create(&user).await.unwrap().unwrap();
    assert!(profile.username.starts_with("user_"));
    assert_ne!(profile.username, "user_550e8400");
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_double_create_failure_surfaces_and_leaves_cache_unset() {
    let store = Arc::new(MemoryStore::default());
    store.fail_all_inserts.store(true, Ordering::SeqCst);
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);

    let err = service.fetch_or_create(&user).await.unwrap_err();
    assert!(matches!(err, Error::ProfileCreationFailed));
    assert!(service.cached().await.is_none());
}

#[tokio::test]
async fn test_update_patches_row_and_cache() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", None);
    service.fetch_or_create(&user).await.unwrap();

    let updated = service
        .update(&user.id, ProfileChanges::username("alice"))
        .await
        .unwrap();
    assert_eq!(updated.username, "alice");
    assert_eq!(service.cached().await.unwrap().username, "alice");
    assert_eq!(
        store.rows.lock().unwrap().get(&user.id).unwrap().username,
        "alice"
    );
}

#[tokio::test]
async fn test_is_username_taken() {
    let store = Arc::new(MemoryStore::default());
    let service = service(&store);
    let user = user("550e8400-e29b-41d4-a716-446655440000", Some("Alice"));
    service.fetch_or_create(&user).await.unwrap();

    assert!(service.is_username_taken("alice").await.unwrap());
    assert!(!service.is_username_taken("bob").await.unwrap());
}

#[tokio::test]
async fn test_upload_avatar_returns_public_url() {
    let store = Arc::new(MemoryStore::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = ProfileService::new(store, storage.clone());

    let url = service
        .upload_avatar("user-1", "me.PNG", vec![1, 2, 3])
        .await
        .unwrap();
    assert!(url.starts_with("https://cdn.test/avatars/user-1-"));
    assert!(url.ends_with(".PNG"));

    let uploads = storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (bucket, _path, size, content_type) = &uploads[0];
    assert_eq!(bucket, "avatars");
    assert_eq!(*size, 3);
    assert_eq!(content_type, "image/png");
}
