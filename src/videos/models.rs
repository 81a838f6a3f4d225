// src/videos/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Gallery / Video Models
// ============================================================================

/// Tag metadata on a video: tag-group name to selected tag names
pub type TagMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    pub name: String,
}

/// Allowed tags for one group, scoped to a gallery. Read-only from this
/// client's perspective; managed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagGroup {
    pub id: String,
    pub gallery_id: String,
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub gallery_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub youtube_id: String,
    #[serde(default)]
    pub tags: TagMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the upload form
#[derive(Debug, Clone, Serialize)]
pub struct NewVideo {
    pub gallery_id: String,
    pub title: String,
    pub description: String,
    pub youtube_id: String,
    pub tags: TagMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewVideo {
    pub fn new(
        gallery_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        youtube_id: impl Into<String>,
        tags: TagMap,
    ) -> Self {
        let now = Utc::now();
        Self {
            gallery_id: gallery_id.into(),
            title: title.into(),
            description: description.into(),
            youtube_id: youtube_id.into(),
            tags,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update from the edit modal
#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Tag Selection
// ============================================================================

/// What happens to a group whose last tag was just toggled off.
///
/// The upload form drops the group key entirely; the edit modal keeps the
/// empty set. Both behaviors ship today, so the difference is an explicit
/// parameter rather than two divergent copies of the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneEmptyGroups {
    Yes,
    No,
}

/// In-memory tag picker state shared by the upload and edit forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    groups: TagMap,
    prune: PruneEmptyGroups,
}

impl TagSelection {
    pub fn new(prune: PruneEmptyGroups) -> Self {
        Self {
            groups: TagMap::new(),
            prune,
        }
    }

    /// Start from a video's existing tag map (edit modal)
    pub fn from_map(groups: TagMap, prune: PruneEmptyGroups) -> Self {
        Self { groups, prune }
    }

    /// Add the tag to its group if absent, remove it if present
    pub fn toggle(&mut self, group: &str, tag: &str) {
        let tags = self.groups.entry(group.to_string()).or_default();
        if let Some(pos) = tags.iter().position(|t| t == tag) {
            tags.remove(pos);
            if tags.is_empty() && self.prune == PruneEmptyGroups::Yes {
                self.groups.remove(group);
            }
        } else {
            tags.push(tag.to_string());
        }
    }

    pub fn contains(&self, group: &str, tag: &str) -> bool {
        self.groups
            .get(group)
            .map(|tags| tags.iter().any(|t| t == tag))
            .unwrap_or(false)
    }

    pub fn as_map(&self) -> &TagMap {
        &self.groups
    }

    pub fn into_map(self) -> TagMap {
        self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(|tags| tags.is_empty())
    }
}
