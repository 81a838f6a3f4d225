// src/videos/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use crate::common::{ValidationResult, Validator};

use super::models::{NewVideo, VideoChanges};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 5000;

/// The expected length of a video id on the external platform
const YOUTUBE_ID_LEN: usize = 11;

fn long_form_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
            .expect("long-form video URL pattern is valid")
    })
}

fn shorts_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*youtube\.com/shorts/([^#&?]*).*")
            .expect("shorts video URL pattern is valid")
    })
}

/// Extract the 11-character video id from a long-form or Shorts URL.
/// No network validation happens; a well-shaped id is taken at face value.
pub fn extract_youtube_id(url: &str) -> Option<String> {
    if let Some(caps) = long_form_pattern().captures(url) {
        if let Some(id) = caps.get(2) {
            if id.as_str().len() == YOUTUBE_ID_LEN {
                return Some(id.as_str().to_string());
            }
        }
    }
    if let Some(caps) = shorts_pattern().captures(url) {
        if let Some(id) = caps.get(1) {
            if id.as_str().len() == YOUTUBE_ID_LEN {
                return Some(id.as_str().to_string());
            }
        }
    }
    None
}

pub fn validate_title(title: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if title.chars().count() < TITLE_MIN_LEN || title.chars().count() > TITLE_MAX_LEN {
        result.add_error("title", "Title must be between 3 and 100 characters");
    }
    result
}

pub fn validate_description(description: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        result.add_error(
            "description",
            "Description cannot be longer than 5000 characters",
        );
    }
    result
}

// ============================================================================
// Video Validators
// ============================================================================

pub struct VideoValidator;

impl Validator<NewVideo> for VideoValidator {
    fn validate(&self, data: &NewVideo) -> ValidationResult {
        let mut result = validate_title(&data.title);
        result.merge(validate_description(&data.description));
        if data.youtube_id.len() != YOUTUBE_ID_LEN {
            result.add_error("youtube_id", "Video id must be 11 characters");
        }
        result
    }
}

impl Validator<VideoChanges> for VideoValidator {
    fn validate(&self, data: &VideoChanges) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Some(title) = &data.title {
            result.merge(validate_title(title));
        }
        if let Some(description) = &data.description {
            result.merge(validate_description(description));
        }
        result
    }
}
