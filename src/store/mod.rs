//! Per-profile vector knowledge store.
//!
//! Each profile lives in its own directory under the data dir and holds two
//! snapshot files, `index.bin` and `metadata.json`, whose entries are aligned
//! by position: record `i` describes vector `i`.

pub mod index;
pub mod metadata;
pub mod profile;
pub mod snapshot;

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::embeddings::{EmbeddingProvider, HashEmbedder};
use crate::error::{Result, VaultError};

pub use index::{Neighbor, VectorIndex};
pub use metadata::{MetadataStore, Record};
pub use profile::{ProfileStore, ScoredRecord, StoreHealth};

/// Name of the profile used when none is given
pub const DEFAULT_PROFILE: &str = "default";

const MAX_PROFILE_LEN: usize = 64;

/// Validated profile name, safe to use as a directory name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Profile(String);

impl Profile {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= MAX_PROFILE_LEN
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            return Err(VaultError::InvalidProfile(format!(
                "'{}' (use 1-{} letters, digits, '-', '_' or '.')",
                name, MAX_PROFILE_LEN
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_PROFILE
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self(DEFAULT_PROFILE.to_string())
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Profile {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Entry point for all store operations.
///
/// Owns one embedding provider and lazily opens a [`ProfileStore`] the first
/// time each profile is used. Every operation names its profile explicitly.
/// There is no internal locking; hosts that share a `KnowledgeStore` across
/// sessions must serialize access themselves.
pub struct KnowledgeStore {
    data_dir: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    profiles: HashMap<Profile, ProfileStore>,
}

impl KnowledgeStore {
    pub fn new(data_dir: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            data_dir: data_dir.into(),
            embedder,
            profiles: HashMap::new(),
        }
    }

    /// Store backed by the default [`HashEmbedder`]
    pub fn with_default_embedder(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(data_dir, Arc::new(HashEmbedder::default()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn profile_dir(&self, profile: &Profile) -> PathBuf {
        self.data_dir.join(profile.as_str())
    }

    /// Open `profile`, loading its snapshot on first use.
    ///
    /// An unusable snapshot is set aside and the profile starts empty (see
    /// [`ProfileStore::load_or_create`]).
    pub fn load_or_create(&mut self, profile: &Profile) -> Result<&mut ProfileStore> {
        let dir = self.profile_dir(profile);
        let embedder = Arc::clone(&self.embedder);

        match self.profiles.entry(profile.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let store = ProfileStore::load_or_create(profile.clone(), dir, embedder)?;
                Ok(entry.insert(store))
            }
        }
    }

    /// Forget the in-memory copy of `profile`; the next access reloads it
    pub fn unload(&mut self, profile: &Profile) {
        self.profiles.remove(profile);
    }

    pub fn add(&mut self, topic: &str, content: &str, source: &str, profile: &Profile) -> Result<usize> {
        self.load_or_create(profile)?.add(topic, content, source)
    }

    pub fn search(&mut self, query: &str, top_k: usize, profile: &Profile) -> Result<Vec<ScoredRecord>> {
        self.load_or_create(profile)?.search(query, top_k)
    }

    pub fn search_exact(&mut self, topic: &str, profile: &Profile) -> Result<Vec<Record>> {
        Ok(self.load_or_create(profile)?.search_exact(topic))
    }

    pub fn list_topics(&mut self, profile: &Profile) -> Result<BTreeSet<String>> {
        Ok(self.load_or_create(profile)?.list_topics())
    }

    pub fn delete_topic(&mut self, topic: &str, profile: &Profile) -> Result<bool> {
        self.load_or_create(profile)?.delete_topic(topic)
    }

    pub fn reindex(&mut self, profile: &Profile) -> Result<usize> {
        self.load_or_create(profile)?.reindex()
    }

    /// Read-only view of the profile's records in id order
    pub fn records(&mut self, profile: &Profile) -> Result<&[Record]> {
        Ok(self.load_or_create(profile)?.records())
    }

    /// Every profile on disk: `default` first, then the rest sorted by name
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut others = BTreeSet::new();

        if self.data_dir.exists() {
            for entry in std::fs::read_dir(&self.data_dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().to_string();
                match Profile::new(name) {
                    Ok(profile) if !profile.is_default() => {
                        others.insert(profile);
                    }
                    _ => {}
                }
            }
        }

        let mut profiles = vec![Profile::default()];
        profiles.extend(others);
        Ok(profiles)
    }

    /// Create the directory for a new profile. Existing profiles are left as is.
    pub fn create_profile(&self, name: &str) -> Result<Profile> {
        let profile = Profile::new(name)?;
        let dir = self.profile_dir(&profile);
        std::fs::create_dir_all(&dir).map_err(|e| VaultError::persistence(&dir, e))?;
        tracing::info!(profile = %profile, "created profile");
        Ok(profile)
    }

    /// Report on the profile's snapshot files without loading it into the cache
    pub fn check(&self, profile: &Profile) -> StoreHealth {
        self::profile::inspect(profile, &self.profile_dir(profile), Arc::clone(&self.embedder))
    }
}
