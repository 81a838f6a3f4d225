// src/videos/tests/tag_tests.rs

use crate::videos::models::{PruneEmptyGroups, TagMap, TagSelection};

#[test]
fn test_toggle_adds_then_removes() {
    let mut selection = TagSelection::new(PruneEmptyGroups::Yes);
    selection.toggle("Season", "Summer");
    assert!(selection.contains("Season", "Summer"));

    selection.toggle("Season", "Summer");
    assert!(!selection.contains("Season", "Summer"));
}

#[test]
fn test_double_toggle_is_identity_when_pruning() {
    let mut selection = TagSelection::new(PruneEmptyGroups::Yes);
    let before = selection.clone();
    selection.toggle("Season", "Summer");
    selection.toggle("Season", "Summer");
    assert_eq!(selection, before);
    assert!(selection.as_map().is_empty());
}

#[test]
fn test_emptied_group_key_survives_without_pruning() {
    // The edit modal's historical behavior: the group stays, empty.
    let mut selection = TagSelection::new(PruneEmptyGroups::No);
    selection.toggle("Season", "Summer");
    selection.toggle("Season", "Summer");

    assert!(!selection.contains("Season", "Summer"));
    assert!(selection.is_empty());
    assert_eq!(selection.as_map().get("Season"), Some(&Vec::new()));
}

#[test]
fn test_toggle_preserves_other_groups_and_tags() {
    let mut selection = TagSelection::new(PruneEmptyGroups::Yes);
    selection.toggle("Season", "Summer");
    selection.toggle("Season", "Winter");
    selection.toggle("Location", "Beach");

    selection.toggle("Season", "Summer");
    assert!(selection.contains("Season", "Winter"));
    assert!(selection.contains("Location", "Beach"));
    assert!(!selection.contains("Season", "Summer"));
}

#[test]
fn test_from_map_round_trip() {
    let mut map = TagMap::new();
    map.insert("Season".to_string(), vec!["Summer".to_string()]);

    let selection = TagSelection::from_map(map.clone(), PruneEmptyGroups::No);
    assert!(selection.contains("Season", "Summer"));
    assert_eq!(selection.into_map(), map);
}
