//! Flat (exhaustive) L2 nearest-neighbor index.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::snapshot;
use crate::embeddings::squared_l2_distance;
use crate::error::{Result, VaultError};

const INDEX_FORMAT: [u8; 4] = *b"KVIX";
const INDEX_VERSION: u32 = 1;

/// One knn hit: the stored vector's position and its squared L2 distance to
/// the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// On-disk layout of `index.bin`
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    format: [u8; 4],
    version: u32,
    dimension: u32,
    /// All vectors back to back, in insertion order
    vectors: Vec<f32>,
}

/// Append-only vector index. Positions are dense and start at 0; there is no
/// in-place delete, callers use [`rebuild`](Self::rebuild) instead.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn count(&self) -> usize {
        if self.dimension == 0 {
            return 0;
        }
        self.data.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored vector at `position`
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// Append a vector and return its position
    pub fn insert(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_dimension(vector)?;
        let position = self.count();
        self.data.extend_from_slice(vector);
        Ok(position)
    }

    /// Remove the most recently inserted vector. Used to roll back an insert
    /// whose snapshot could not be written.
    pub(crate) fn pop(&mut self) {
        let len = self.data.len().saturating_sub(self.dimension);
        self.data.truncate(len);
    }

    /// Up to `k` stored vectors closest to `query`, nearest first.
    ///
    /// Ties are broken by lower position so results are deterministic.
    pub fn knn(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: squared_l2_distance(query, stored),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Discard all contents and insert `vectors` in order, renumbering from 0.
    ///
    /// Every vector is validated before anything is replaced, so on error the
    /// index is unchanged.
    pub fn rebuild<I, V>(&mut self, vectors: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut data = Vec::new();
        for vector in vectors {
            let vector = vector.as_ref();
            self.check_dimension(vector)?;
            data.extend_from_slice(vector);
        }
        self.data = data;
        Ok(())
    }

    /// Write the whole index to `path`
    pub fn persist(&self, path: &Path) -> Result<()> {
        let on_disk = IndexSnapshot {
            format: INDEX_FORMAT,
            version: INDEX_VERSION,
            dimension: self.dimension as u32,
            vectors: self.data.clone(),
        };
        let bytes = bincode::serialize(&on_disk).map_err(|e| VaultError::CorruptSnapshot {
            path: path.to_path_buf(),
            reason: format!("encode failed: {}", e),
        })?;
        snapshot::write_atomic(path, &bytes)
    }

    /// Read an index previously written by [`persist`](Self::persist)
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = snapshot::read(path)?;
        let corrupt = |reason: String| VaultError::CorruptSnapshot {
            path: path.to_path_buf(),
            reason,
        };

        let on_disk: IndexSnapshot =
            bincode::deserialize(&bytes).map_err(|e| corrupt(format!("decode failed: {}", e)))?;

        if on_disk.format != INDEX_FORMAT {
            return Err(corrupt("not a vector index file".into()));
        }
        if on_disk.version != INDEX_VERSION {
            return Err(corrupt(format!(
                "unsupported index version {}",
                on_disk.version
            )));
        }
        let dimension = on_disk.dimension as usize;
        if dimension == 0 {
            return Err(corrupt("index dimension is zero".into()));
        }
        if on_disk.vectors.len() % dimension != 0 {
            return Err(corrupt(format!(
                "{} values do not divide into vectors of {}",
                on_disk.vectors.len(),
                dimension
            )));
        }

        Ok(Self {
            dimension,
            data: on_disk.vectors,
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VaultError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
