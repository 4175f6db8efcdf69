//! Red Queen Protocol: adversarial tests against the on-disk snapshots
//!
//! Damage the profile directory in ways a crash, a bad copy or a hand edit
//! could, and check the store neither panics nor serves misaligned results.

use std::fs;
use std::path::{Path, PathBuf};

use knowledge_vault::store::{KnowledgeStore, Profile, VectorIndex};
use knowledge_vault::VaultError;
use tempfile::TempDir;

fn seeded(temp: &TempDir) -> PathBuf {
    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let profile = Profile::default();
    store.add("Cats", "Cats are mammals.", "manual", &profile).unwrap();
    store.add("Dogs", "Dogs are mammals.", "manual", &profile).unwrap();
    store.add("Fish", "Fish live in water.", "manual", &profile).unwrap();
    temp.path().join("default")
}

fn quarantined(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.contains(".corrupt-"))
        .collect();
    names.sort();
    names
}

#[test]
fn red_queen_truncated_index_recovers_empty() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);

    let bytes = fs::read(dir.join("index.bin")).unwrap();
    fs::write(dir.join("index.bin"), &bytes[..bytes.len() / 2]).unwrap();

    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let profile = Profile::default();
    assert!(store.search("mammals", 5, &profile).unwrap().is_empty());

    // Both files set aside, nothing overwritten
    let moved = quarantined(&dir);
    assert_eq!(moved.len(), 2, "expected both snapshots moved aside: {:?}", moved);

    // The profile is usable again from id 0
    assert_eq!(store.add("Birds", "Birds fly.", "manual", &profile).unwrap(), 0);
}

#[test]
fn red_queen_garbage_metadata_recovers_empty() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);
    fs::write(dir.join("metadata.json"), "{ this is not json").unwrap();

    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    assert!(store.list_topics(&Profile::default()).unwrap().is_empty());
    assert_eq!(quarantined(&dir).len(), 2);
}

#[test]
fn red_queen_dropped_record_is_inconsistent() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);

    // Drop the last record by hand so ids still match positions
    let raw = fs::read_to_string(dir.join("metadata.json")).unwrap();
    let mut records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    records.pop();
    fs::write(
        dir.join("metadata.json"),
        serde_json::to_string_pretty(&records).unwrap(),
    )
    .unwrap();

    let store = KnowledgeStore::with_default_embedder(temp.path());
    let health = store.check(&Profile::default());
    assert!(!health.is_healthy());
    assert_eq!(health.records, Some(2));
    assert_eq!(health.vectors, Some(3));

    // `check` must not have repaired or moved anything
    assert!(quarantined(&dir).is_empty());
}

#[test]
fn red_queen_missing_index_with_records_is_inconsistent() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);
    fs::remove_file(dir.join("index.bin")).unwrap();

    let store = KnowledgeStore::with_default_embedder(temp.path());
    let health = store.check(&Profile::default());
    assert_eq!(health.index_bytes, None);
    assert_eq!(health.records, Some(3));
    assert_eq!(health.vectors, Some(0));
    assert!(health.problem.unwrap().contains("Inconsistent"));
}

#[test]
fn red_queen_empty_index_without_metadata_is_fine() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("default");
    VectorIndex::new(64).persist(&dir.join("index.bin")).unwrap();

    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let profile = Profile::default();
    assert!(store.check(&profile).is_healthy());
    assert_eq!(store.add("A", "first", "manual", &profile).unwrap(), 0);
    assert!(quarantined(&dir).is_empty());
}

#[test]
fn red_queen_shuffled_ids_are_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);

    let raw = fs::read_to_string(dir.join("metadata.json")).unwrap();
    let mut records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    records.swap(0, 1);
    fs::write(
        dir.join("metadata.json"),
        serde_json::to_string_pretty(&records).unwrap(),
    )
    .unwrap();

    let health = KnowledgeStore::with_default_embedder(temp.path()).check(&Profile::default());
    assert!(health.problem.unwrap().contains("position 0 has id 1"));
}

#[test]
fn red_queen_wrong_dimension_index_needs_reindex() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("default");

    let mut index = VectorIndex::new(3);
    index.insert(&[1.0, 2.0, 3.0]).unwrap();
    index.persist(&dir.join("index.bin")).unwrap();
    fs::write(
        dir.join("metadata.json"),
        r#"[{"id":0,"topic":"T","content":"c","source":"manual","date":"2024-01-01 10:00:00"}]"#,
    )
    .unwrap();

    let health = KnowledgeStore::with_default_embedder(temp.path()).check(&Profile::default());
    assert!(health.problem.unwrap().contains("reindex required"));
}

#[test]
fn red_queen_path_traversal_profiles_rejected() {
    for name in ["..", ".", "../escape", "a/b", "a\\b", "", "name with space"] {
        assert!(
            matches!(Profile::new(name), Err(VaultError::InvalidProfile(_))),
            "profile name {:?} should be rejected",
            name
        );
    }
}

#[test]
fn red_queen_unicode_survives_reload() {
    let temp = TempDir::new().unwrap();
    let profile = Profile::new("intl").unwrap();
    {
        let mut store = KnowledgeStore::with_default_embedder(temp.path());
        store
            .add("猫", "猫は哺乳類です。ゴロゴロ鳴きます。", "手動", &profile)
            .unwrap();
        store.add("Émojis 🐱", "Ça ronronne 😺", "manual", &profile).unwrap();
    }

    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let exact = store.search_exact("猫", &profile).unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].source, "手動");
    assert!(store.list_topics(&profile).unwrap().contains("Émojis 🐱"));
}

#[test]
fn red_queen_huge_top_k_is_clamped() {
    let temp = TempDir::new().unwrap();
    seeded(&temp);
    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let results = store.search("mammals", usize::MAX, &Profile::default()).unwrap();
    assert_eq!(results.len(), 3);
}

#[test]
fn red_queen_zero_top_k_returns_nothing() {
    let temp = TempDir::new().unwrap();
    seeded(&temp);
    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    assert!(store.search("mammals", 0, &Profile::default()).unwrap().is_empty());
}

#[test]
fn red_queen_profiles_do_not_leak() {
    let temp = TempDir::new().unwrap();
    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    let work = Profile::new("work").unwrap();
    let home = Profile::new("home").unwrap();

    store.add("Secret", "quarterly numbers", "manual", &work).unwrap();
    store.add("Recipe", "pancakes", "manual", &home).unwrap();

    assert!(store.search_exact("Secret", &home).unwrap().is_empty());
    let hits = store.search("quarterly numbers", 10, &home).unwrap();
    assert!(hits.iter().all(|h| h.record.topic != "Secret"));
    assert!(!store.delete_topic("Secret", &home).unwrap());
    assert_eq!(store.search_exact("Secret", &work).unwrap().len(), 1);
}

#[test]
fn red_queen_failed_metadata_write_keeps_profile_on_restart() {
    let temp = TempDir::new().unwrap();
    let dir = seeded(&temp);
    let profile = Profile::default();
    let metadata = dir.join("metadata.json");
    let good = fs::read(&metadata).unwrap();

    let mut store = KnowledgeStore::with_default_embedder(temp.path());
    assert_eq!(store.records(&profile).unwrap().len(), 3);

    // A directory in place of the metadata file makes the write fail
    fs::remove_file(&metadata).unwrap();
    fs::create_dir(&metadata).unwrap();
    fs::write(metadata.join("occupied"), b"x").unwrap();

    assert!(store.add("Birds", "Birds fly.", "manual", &profile).is_err());
    assert_eq!(store.records(&profile).unwrap().len(), 3);

    fs::remove_dir_all(&metadata).unwrap();
    fs::write(&metadata, &good).unwrap();

    let mut restarted = KnowledgeStore::with_default_embedder(temp.path());
    assert!(restarted.check(&profile).is_healthy());
    assert_eq!(restarted.records(&profile).unwrap().len(), 3);
    assert!(quarantined(&dir).is_empty());
}
