// src/videos/tests/validators_tests.rs

use crate::common::Validator;
use crate::videos::models::{NewVideo, TagMap, VideoChanges};
use crate::videos::validators::*;

fn draft(title: &str, description: &str, youtube_id: &str) -> NewVideo {
    NewVideo::new("g-1", title, description, youtube_id, TagMap::new())
}

#[test]
fn test_extract_id_from_long_form_urls() {
    let cases = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "http://youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "https://www.youtube.com/v/dQw4w9WgXcQ",
        "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ#comments",
    ];
    for url in cases {
        assert_eq!(
            extract_youtube_id(url).as_deref(),
            Some("dQw4w9WgXcQ"),
            "failed for {}",
            url
        );
    }
}

#[test]
fn test_extract_id_from_shorts_urls() {
    assert_eq!(
        extract_youtube_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
        Some("dQw4w9WgXcQ")
    );
    assert_eq!(
        extract_youtube_id("https://youtube.com/shorts/dQw4w9WgXcQ?feature=share").as_deref(),
        Some("dQw4w9WgXcQ")
    );
}

#[test]
fn test_extract_id_rejects_non_matching_strings() {
    let cases = [
        "",
        "not a url",
        // Wrong id length
        "https://www.youtube.com/watch?v=short",
        "https://www.youtube.com/watch?v=waytoolongid123",
        "https://www.youtube.com/shorts/short",
        "https://vimeo.com/123456789",
    ];
    for url in cases {
        assert_eq!(extract_youtube_id(url), None, "should reject {}", url);
    }
}

#[test]
fn test_title_length_bounds() {
    assert!(!validate_title("ab").is_valid);
    assert!(validate_title("abc").is_valid);
    assert!(validate_title(&"a".repeat(100)).is_valid);
    assert!(!validate_title(&"a".repeat(101)).is_valid);
    assert!(!validate_title("").is_valid);
}

#[test]
fn test_description_length_bounds() {
    assert!(validate_description("").is_valid);
    assert!(validate_description(&"a".repeat(5000)).is_valid);
    assert!(!validate_description(&"a".repeat(5001)).is_valid);
}

#[test]
fn test_new_video_validator() {
    let result = VideoValidator.validate(&draft("My video", "desc", "dQw4w9WgXcQ"));
    assert!(result.is_valid);

    let result = VideoValidator.validate(&draft("ab", "desc", "dQw4w9WgXcQ"));
    assert!(!result.is_valid);
    assert_eq!(result.errors[0].field, "title");

    let result = VideoValidator.validate(&draft("My video", "desc", "bad"));
    assert!(!result.is_valid);
    assert_eq!(result.errors[0].field, "youtube_id");
}

#[test]
fn test_video_changes_validator_only_checks_present_fields() {
    let changes = VideoChanges {
        description: Some("a".repeat(5001)),
        ..Default::default()
    };
    let result = VideoValidator.validate(&changes);
    assert!(!result.is_valid);

    // Absent title is not an error even though "" would be too short.
    let result = VideoValidator.validate(&VideoChanges::default());
    assert!(result.is_valid);
}
