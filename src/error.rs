use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a snapshot file failed.
    #[error("Persistence error at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata and index snapshots disagree on how many entries exist.
    #[error(
        "Inconsistent state for profile '{profile}': {records} records but {vectors} vectors"
    )]
    InconsistentState {
        profile: String,
        records: usize,
        vectors: usize,
    },

    #[error("Corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid profile name: {0}")]
    InvalidProfile(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl VaultError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True for snapshot problems that `load_or_create` recovers from by
    /// starting the profile empty.
    pub fn is_recoverable_snapshot(&self) -> bool {
        matches!(
            self,
            Self::InconsistentState { .. } | Self::CorruptSnapshot { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
