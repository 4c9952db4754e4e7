// Persistence and idempotency tests for the episode store.
// Run with: cargo test --lib store::tests

use crate::store::{EpisodeRecord, Store};
use tempfile::TempDir;

fn setup_store() -> (Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let episodes = temp_dir.path().join("data").join("episodes.json");
    let state = temp_dir.path().join("data").join("state.json");
    let store = Store::open(&episodes, &state).unwrap();
    (store, temp_dir)
}

fn record(guid: &str, title: &str) -> EpisodeRecord {
    EpisodeRecord {
        guid: guid.to_string(),
        title: title.to_string(),
        description: "desc".to_string(),
        author: "Author".to_string(),
        link: format!("https://example.test/{}", guid),
        pub_date_iso: "2024-05-14T10:30:00+00:00".to_string(),
        audio_file: format!("2024-05-14-{}.mp3", guid),
        audio_url: format!("https://cdn.test/audio/2024-05-14-{}.mp3", guid),
        audio_size_bytes: 1024,
    }
}

#[test]
fn test_open_defaults_when_files_absent() {
    let (store, _tmp) = setup_store();
    assert_eq!(store.episode_count(), 0);
    assert_eq!(store.processed_count(), 0);
}

#[test]
fn test_upsert_appends() {
    let (mut store, _tmp) = setup_store();
    store.upsert_episode(record("a", "First"));
    store.upsert_episode(record("b", "Second"));
    assert_eq!(store.episode_count(), 2);
}

#[test]
fn test_upsert_replaces_same_guid() {
    let (mut store, _tmp) = setup_store();
    store.upsert_episode(record("a", "First pass"));
    store.upsert_episode(record("b", "Other"));
    store.upsert_episode(record("a", "Second pass"));

    // Exactly one record for the guid, with the later content.
    assert_eq!(store.episode_count(), 2);
    let titles: Vec<&str> = store
        .episodes()
        .iter()
        .filter(|ep| ep.guid == "a")
        .map(|ep| ep.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Second pass"]);
}

#[test]
fn test_mark_processed_is_idempotent() {
    let (mut store, _tmp) = setup_store();
    store.mark_processed("a");
    store.mark_processed("a");
    store.mark_processed("b");
    assert_eq!(store.processed_count(), 2);
    assert!(store.is_processed("a"));
    assert!(!store.is_processed("c"));
}

#[test]
fn test_save_and_reload_roundtrip() {
    let (mut store, tmp) = setup_store();
    store.upsert_episode(record("a", "First"));
    store.mark_processed("a");
    store.mark_processed("z");
    store.save().unwrap();

    let episodes = tmp.path().join("data").join("episodes.json");
    let state = tmp.path().join("data").join("state.json");
    let reloaded = Store::open(&episodes, &state).unwrap();

    assert_eq!(reloaded.episode_count(), 1);
    assert_eq!(reloaded.episodes()[0].title, "First");
    assert!(reloaded.is_processed("a"));
    assert!(reloaded.is_processed("z"));
}

#[test]
fn test_processed_set_grows_monotonically_across_saves() {
    let (mut store, tmp) = setup_store();
    store.mark_processed("a");
    store.save().unwrap();

    let episodes = tmp.path().join("data").join("episodes.json");
    let state = tmp.path().join("data").join("state.json");
    let mut second = Store::open(&episodes, &state).unwrap();
    second.mark_processed("b");
    second.save().unwrap();

    let third = Store::open(&episodes, &state).unwrap();
    assert!(third.is_processed("a"));
    assert!(third.is_processed("b"));
}

#[test]
fn test_state_file_serializes_sorted_guids() {
    let (mut store, tmp) = setup_store();
    store.mark_processed("zebra");
    store.mark_processed("alpha");
    store.mark_processed("mango");
    store.save().unwrap();

    let raw = std::fs::read_to_string(tmp.path().join("data").join("state.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let guids: Vec<&str> = parsed["processed_guids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(guids, vec!["alpha", "mango", "zebra"]);
}

#[test]
fn test_save_leaves_no_temp_files() {
    let (mut store, tmp) = setup_store();
    store.upsert_episode(record("a", "First"));
    store.save().unwrap();

    let data_dir = tmp.path().join("data");
    let leftovers: Vec<String> = std::fs::read_dir(&data_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "stray temp files: {:?}", leftovers);
}

#[test]
fn test_open_tolerates_legacy_state_without_guids_field() {
    let tmp = TempDir::new().unwrap();
    let episodes = tmp.path().join("episodes.json");
    let state = tmp.path().join("state.json");
    std::fs::write(&state, "{}").unwrap();

    let store = Store::open(&episodes, &state).unwrap();
    assert_eq!(store.processed_count(), 0);
}
