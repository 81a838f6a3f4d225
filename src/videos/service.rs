// src/videos/service.rs
//! Gallery/video data access for the upload, gallery and manage views.

use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::GalleryApi;
use crate::common::{Error, Validator};
use crate::events::{AppEvent, EventBus};

use super::models::{Gallery, NewVideo, TagGroup, TagMap, Video, VideoChanges};
use super::validators::{extract_youtube_id, VideoValidator};

#[derive(Clone)]
pub struct VideoService {
    api: Arc<dyn GalleryApi>,
    events: EventBus,
}

impl VideoService {
    pub fn new(api: Arc<dyn GalleryApi>, events: EventBus) -> Self {
        Self { api, events }
    }

    pub async fn gallery(&self, gallery_id: &str) -> Result<Option<Gallery>, Error> {
        self.api.get_gallery(gallery_id).await
    }

    pub async fn tag_groups(&self, gallery_id: &str) -> Result<Vec<TagGroup>, Error> {
        self.api.list_tag_groups(gallery_id).await
    }

    pub async fn videos(&self, gallery_id: &str) -> Result<Vec<Video>, Error> {
        self.api.list_videos(gallery_id).await
    }

    /// Upload-form submit: validate everything locally, then insert.
    /// Nothing is sent to the backend when validation fails.
    pub async fn upload(
        &self,
        gallery_id: &str,
        title: &str,
        description: &str,
        youtube_url: &str,
        tags: TagMap,
    ) -> Result<Video, Error> {
        let youtube_id = extract_youtube_id(youtube_url).ok_or_else(|| {
            Error::Validation("Invalid YouTube URL. Please enter a valid URL.".to_string())
        })?;

        let draft = NewVideo::new(gallery_id, title, description, youtube_id, tags);
        let result = VideoValidator.validate(&draft);
        if !result.is_valid {
            return Err(result.into());
        }

        let video = self.api.insert_video(&draft).await?;
        info!(video_id = %video.id, gallery_id = %gallery_id, "Video uploaded");
        Ok(video)
    }

    /// Edit-modal save: patch the row, then announce the update
    pub async fn update(&self, video_id: &str, mut changes: VideoChanges) -> Result<Video, Error> {
        let result = VideoValidator.validate(&changes);
        if !result.is_valid {
            return Err(result.into());
        }

        changes.updated_at = Some(chrono::Utc::now());
        let video = self.api.update_video(video_id, &changes).await?;
        debug!(video_id = %video_id, "Video updated");
        self.events.publish(AppEvent::VideoUpdated(video.clone()));
        Ok(video)
    }

    /// Manage-page delete: remove the row, then announce the deletion
    pub async fn delete(&self, video_id: &str) -> Result<(), Error> {
        self.api.delete_video(video_id).await?;
        debug!(video_id = %video_id, "Video deleted");
        self.events.publish(AppEvent::VideoDeleted {
            video_id: video_id.to_string(),
        });
        Ok(())
    }
}
