use std::collections::BTreeSet;
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::snapshot;
use crate::error::{Result, VaultError};

/// Timestamp layout used in `metadata.json`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored unit of knowledge.
///
/// `id` is the record's position in its profile, not a stable identifier: it
/// changes whenever the profile is rebuilt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: usize,
    pub topic: String,
    pub content: String,
    pub source: String,
    #[serde(rename = "date", with = "date_format")]
    pub created_at: NaiveDateTime,
}

impl Record {
    /// New record stamped with the current local time. The id is assigned on
    /// [`MetadataStore::append`].
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: 0,
            topic: topic.into(),
            content: content.into(),
            source: source.into(),
            created_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    pub fn date_string(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }
}

mod date_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Ordered records, positionally aligned with the vector index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    records: Vec<Record>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records in order, rewriting every id to its position
    pub fn renumbered(records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.id = i;
                r
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record, assigning its id, and return the position
    pub fn append(&mut self, mut record: Record) -> usize {
        let position = self.records.len();
        record.id = position;
        self.records.push(record);
        position
    }

    pub(crate) fn pop(&mut self) -> Option<Record> {
        self.records.pop()
    }

    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Records whose topic equals `topic` exactly (case-sensitive)
    pub fn filter_by_topic(&self, topic: &str) -> Vec<&Record> {
        self.records.iter().filter(|r| r.topic == topic).collect()
    }

    pub fn topics(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.topic.clone()).collect()
    }

    /// Split off the records matching `topic`.
    ///
    /// Leaves `self` untouched and returns how many records matched plus the
    /// survivors in their original order, ids not yet renumbered.
    pub fn remove_by_topic(&self, topic: &str) -> (usize, Vec<Record>) {
        let survivors: Vec<Record> = self
            .records
            .iter()
            .filter(|r| r.topic != topic)
            .cloned()
            .collect();
        (self.records.len() - survivors.len(), survivors)
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        snapshot::write_atomic(path, json.as_bytes())
    }

    /// Load `metadata.json`, checking that every id equals its position
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = snapshot::read(path)?;
        let records: Vec<Record> =
            serde_json::from_slice(&bytes).map_err(|e| VaultError::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if let Some((position, record)) = records.iter().enumerate().find(|(i, r)| r.id != *i) {
            return Err(VaultError::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: format!("record at position {} has id {}", position, record.id),
            });
        }

        Ok(Self { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(topics: &[&str]) -> MetadataStore {
        let mut store = MetadataStore::new();
        for (i, topic) in topics.iter().enumerate() {
            store.append(Record::new(*topic, format!("content {}", i), "manual"));
        }
        store
    }

    #[test]
    fn test_append_assigns_positions() {
        let mut store = MetadataStore::new();
        let mut record = Record::new("Cats", "purr", "manual");
        record.id = 42;
        assert_eq!(store.append(record), 0);
        assert_eq!(store.append(Record::new("Dogs", "bark", "manual")), 1);
        assert_eq!(store.all()[0].id, 0);
        assert_eq!(store.all()[1].id, 1);
    }

    #[test]
    fn test_filter_by_topic_is_exact_and_case_sensitive() {
        let store = store_with(&["Cats", "cats", "Cats ", "Cats"]);
        let hits = store.filter_by_topic("Cats");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 3);
    }

    #[test]
    fn test_topics_are_distinct() {
        let store = store_with(&["A", "B", "A"]);
        let topics: Vec<String> = store.topics().into_iter().collect();
        assert_eq!(topics, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_remove_by_topic_keeps_order_and_self() {
        let store = store_with(&["A", "B", "A", "C"]);
        let (removed, survivors) = store.remove_by_topic("A");
        assert_eq!(removed, 2);
        let topics: Vec<&str> = survivors.iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics, vec!["B", "C"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_remove_by_topic_absent() {
        let store = store_with(&["A"]);
        let (removed, survivors) = store.remove_by_topic("Z");
        assert_eq!(removed, 0);
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn test_renumbered_rewrites_ids() {
        let store = store_with(&["A", "B", "C"]);
        let (_, survivors) = store.remove_by_topic("A");
        let renumbered = MetadataStore::renumbered(survivors);
        let ids: Vec<usize> = renumbered.all().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(renumbered.all()[0].topic, "B");
    }

    #[test]
    fn test_date_serialized_in_expected_format() {
        let mut record = Record::new("T", "c", "s");
        record.created_at =
            NaiveDateTime::parse_from_str("2024-03-05 07:08:09", DATE_FORMAT).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-03-05 07:08:09");
        assert_eq!(json["id"], 0);
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_new_record_has_whole_seconds() {
        let record = Record::new("T", "c", "s");
        assert_eq!(record.created_at.nanosecond(), 0);
    }

    #[test]
    fn test_persist_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metadata.json");
        let store = store_with(&["Cats", "Dogs"]);
        store.persist(&path).unwrap();

        let loaded = MetadataStore::load(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_rejects_misnumbered_ids() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metadata.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "topic": "A", "content": "x", "source": "", "date": "2024-01-01 00:00:00"}]"#,
        )
        .unwrap();
        let err = MetadataStore::load(&path).unwrap_err();
        assert!(matches!(err, VaultError::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metadata.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = MetadataStore::load(&path).unwrap_err();
        assert!(matches!(err, VaultError::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_load_accepts_original_layout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metadata.json");
        std::fs::write(
            &path,
            r#"[{"id": 0, "topic": "Cats", "content": "Cats purr.", "source": "manual", "date": "2023-06-01 12:30:00"}]"#,
        )
        .unwrap();
        let store = MetadataStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].date_string(), "2023-06-01 12:30:00");
    }
}
