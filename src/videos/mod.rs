// src/videos/mod.rs

pub mod models;
pub mod query;
pub mod service;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::{
    Gallery, NewVideo, PruneEmptyGroups, TagGroup, TagMap, TagSelection, Video, VideoChanges,
};
pub use query::{VideoPage, VideoQuery, VIDEOS_PER_PAGE_OPTIONS};
pub use service::VideoService;
pub use validators::{extract_youtube_id, VideoValidator};
