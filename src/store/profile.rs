use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::index::VectorIndex;
use super::metadata::{MetadataStore, Record};
use super::{snapshot, Profile};
use crate::embeddings::{relative_similarities, EmbeddingProvider};
use crate::error::{Result, VaultError};

pub const INDEX_FILE: &str = "index.bin";
pub const METADATA_FILE: &str = "metadata.json";

/// A search hit: the record plus its per-query relative similarity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: Record,
    /// `1 - distance / max distance in this result set`, in `[0, 1]`.
    /// Relative to this query's hits only; not comparable across queries.
    pub score: f32,
    /// Squared L2 distance between the query and the record's vector
    pub distance: f32,
}

/// The index and metadata of one profile.
///
/// Every mutation is persisted before it returns. If the write fails the
/// in-memory state is left as it was before the call.
pub struct ProfileStore {
    profile: Profile,
    dir: PathBuf,
    index: VectorIndex,
    metadata: MetadataStore,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("profile", &self.profile)
            .field("dir", &self.dir)
            .field("records", &self.metadata.len())
            .field("vectors", &self.index.count())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl ProfileStore {
    /// Empty store for `profile`; nothing is written until the first mutation
    pub fn empty(profile: Profile, dir: PathBuf, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index: VectorIndex::new(embedder.dimension()),
            metadata: MetadataStore::new(),
            profile,
            dir,
            embedder,
        }
    }

    /// Strict load: any snapshot problem is returned as an error.
    ///
    /// A profile without snapshot files opens empty. A single missing file is
    /// treated as holding zero entries, which surfaces as `InconsistentState`
    /// whenever the other file is not empty.
    pub fn open(profile: Profile, dir: PathBuf, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        let metadata_path = dir.join(METADATA_FILE);

        if !index_path.exists() && !metadata_path.exists() {
            tracing::debug!(profile = %profile, "no snapshot found, starting empty");
            return Ok(Self::empty(profile, dir, embedder));
        }

        let index = if index_path.exists() {
            VectorIndex::load(&index_path)?
        } else {
            VectorIndex::new(embedder.dimension())
        };
        let metadata = if metadata_path.exists() {
            MetadataStore::load(&metadata_path)?
        } else {
            MetadataStore::new()
        };

        if metadata.len() != index.count() {
            return Err(VaultError::InconsistentState {
                profile: profile.to_string(),
                records: metadata.len(),
                vectors: index.count(),
            });
        }

        let index = if index.dimension() == embedder.dimension() {
            index
        } else if index.is_empty() {
            VectorIndex::new(embedder.dimension())
        } else {
            return Err(VaultError::CorruptSnapshot {
                path: index_path,
                reason: format!(
                    "index holds {}-dimensional vectors but provider '{}' produces {}; reindex required",
                    index.dimension(),
                    embedder.name(),
                    embedder.dimension()
                ),
            });
        };

        tracing::debug!(
            profile = %profile,
            records = metadata.len(),
            "loaded profile snapshot"
        );

        Ok(Self {
            profile,
            dir,
            index,
            metadata,
            embedder,
        })
    }

    /// Load the profile, or start empty when its snapshot is unusable.
    ///
    /// Inconsistent or corrupt snapshot files are moved aside (never
    /// overwritten) and the profile starts empty, so the content has to be
    /// ingested again. Plain I/O failures are returned.
    pub fn load_or_create(
        profile: Profile,
        dir: PathBuf,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        match Self::open(profile.clone(), dir.clone(), Arc::clone(&embedder)) {
            Ok(store) => Ok(store),
            Err(e) if e.is_recoverable_snapshot() => {
                tracing::warn!(profile = %profile, error = %e, "discarding unusable snapshot");
                for file in [INDEX_FILE, METADATA_FILE] {
                    if let Some(moved) = snapshot::quarantine(&dir.join(file))? {
                        tracing::warn!(profile = %profile, path = %moved.display(), "snapshot moved aside");
                    }
                }
                Ok(Self::empty(profile, dir, embedder))
            }
            Err(e) => Err(e),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn count(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// All records in id order
    pub fn records(&self) -> &[Record] {
        self.metadata.all()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Embed `content`, store it under `topic`, persist, and return the new id
    pub fn add(&mut self, topic: &str, content: &str, source: &str) -> Result<usize> {
        let vector = self.embedder.embed(content);
        let position = self.index.insert(&vector)?;
        let id = self.metadata.append(Record::new(topic, content, source));
        debug_assert_eq!(position, id);

        if let Err(e) = self.save() {
            self.index.pop();
            self.metadata.pop();
            self.restore_index_file();
            return Err(e);
        }

        tracing::info!(profile = %self.profile, id, topic, "added record");
        Ok(id)
    }

    /// Nearest records to `query`, most similar first
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let k = top_k.min(self.count());
        let query_vector = self.embedder.embed(query);
        let neighbors = self.index.knn(&query_vector, k)?;

        let distances: Vec<f32> = neighbors.iter().map(|n| n.distance).collect();
        let scores = relative_similarities(&distances);

        let results: Vec<ScoredRecord> = neighbors
            .iter()
            .zip(scores)
            .filter_map(|(neighbor, score)| {
                self.metadata
                    .get(neighbor.position)
                    .map(|record| ScoredRecord {
                        record: record.clone(),
                        score,
                        distance: neighbor.distance,
                    })
            })
            .collect();

        tracing::debug!(profile = %self.profile, k, hits = results.len(), "similarity search");
        Ok(results)
    }

    /// Records whose topic equals `topic` exactly
    pub fn search_exact(&self, topic: &str) -> Vec<Record> {
        self.metadata
            .filter_by_topic(topic)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_topics(&self) -> BTreeSet<String> {
        self.metadata.topics()
    }

    /// Remove every record with `topic`.
    ///
    /// The index has no in-place delete, so all surviving records are
    /// re-embedded and the index rebuilt, with ids renumbered from 0. Returns
    /// `false` without touching anything when no record matches.
    pub fn delete_topic(&mut self, topic: &str) -> Result<bool> {
        let (removed, survivors) = self.metadata.remove_by_topic(topic);
        if removed == 0 {
            return Ok(false);
        }

        self.replace_with(survivors)?;
        tracing::info!(
            profile = %self.profile,
            topic,
            removed,
            remaining = self.count(),
            "deleted topic and rebuilt index"
        );
        Ok(true)
    }

    /// Re-embed every record with the current provider and rebuild the index.
    /// Returns the number of records re-embedded.
    pub fn reindex(&mut self) -> Result<usize> {
        let records = self.metadata.all().to_vec();
        self.replace_with(records)?;
        tracing::info!(
            profile = %self.profile,
            records = self.count(),
            provider = self.embedder.name(),
            "reindexed profile"
        );
        Ok(self.count())
    }

    /// Write the index snapshot, then the metadata snapshot
    pub fn save(&self) -> Result<()> {
        write_snapshot(&self.dir, &self.index, &self.metadata)
    }

    /// Build a fresh index and metadata from `records`, persist them, and only
    /// then swap them in.
    fn replace_with(&mut self, records: Vec<Record>) -> Result<()> {
        let texts: Vec<&str> = records.iter().map(|r| r.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts);

        let mut index = VectorIndex::new(self.embedder.dimension());
        index.rebuild(&vectors)?;
        let metadata = MetadataStore::renumbered(records);

        if let Err(e) = write_snapshot(&self.dir, &index, &metadata) {
            self.restore_index_file();
            return Err(e);
        }

        self.index = index;
        self.metadata = metadata;
        Ok(())
    }

    /// Put the in-memory index back on disk after a failed snapshot write.
    ///
    /// The index file is written before the metadata file, so a failed
    /// metadata write would otherwise leave an index that no longer matches
    /// the records on disk.
    fn restore_index_file(&self) {
        let path = self.dir.join(INDEX_FILE);
        if let Err(e) = self.index.persist(&path) {
            tracing::warn!(
                profile = %self.profile,
                path = %path.display(),
                error = %e,
                "could not restore index snapshot after failed write"
            );
        }
    }
}

fn write_snapshot(dir: &Path, index: &VectorIndex, metadata: &MetadataStore) -> Result<()> {
    index.persist(&dir.join(INDEX_FILE))?;
    metadata.persist(&dir.join(METADATA_FILE))
}

/// Read-only report on a profile's snapshot files
#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub profile: String,
    pub dir: PathBuf,
    pub index_bytes: Option<u64>,
    pub metadata_bytes: Option<u64>,
    pub records: Option<usize>,
    pub vectors: Option<usize>,
    pub topics: Option<usize>,
    /// Error a strict load reports, if any
    pub problem: Option<String>,
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        self.problem.is_none()
    }
}

/// Inspect a profile's snapshot without recovering or writing anything
pub fn inspect(profile: &Profile, dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> StoreHealth {
    let size = |name: &str| std::fs::metadata(dir.join(name)).ok().map(|m| m.len());

    let mut health = StoreHealth {
        profile: profile.to_string(),
        dir: dir.to_path_buf(),
        index_bytes: size(INDEX_FILE),
        metadata_bytes: size(METADATA_FILE),
        records: None,
        vectors: None,
        topics: None,
        problem: None,
    };

    match ProfileStore::open(profile.clone(), dir.to_path_buf(), embedder) {
        Ok(store) => {
            health.records = Some(store.count());
            health.vectors = Some(store.index().count());
            health.topics = Some(store.list_topics().len());
        }
        Err(e) => {
            if let VaultError::InconsistentState {
                records, vectors, ..
            } = &e
            {
                health.records = Some(*records);
                health.vectors = Some(*vectors);
            }
            health.problem = Some(e.to_string());
        }
    }

    health
}
