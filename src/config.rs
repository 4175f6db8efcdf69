use std::path::PathBuf;

use crate::error::{Result, VaultError};
use crate::store::{Profile, DEFAULT_PROFILE};

/// Overrides the data directory (`~` and `$VAR` are expanded)
pub const ENV_DATA_DIR: &str = "KVAULT_DATA_DIR";
/// Overrides the profile used when `--profile` is not given
pub const ENV_PROFILE: &str = "KVAULT_PROFILE";
/// Overrides the default number of search results
pub const ENV_TOP_K: &str = "KVAULT_TOP_K";

/// Results returned by `search` when no count is given
pub const DEFAULT_TOP_K: usize = 5;
/// Hits consulted when answering a question
pub const ANSWER_TOP_K: usize = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one subdirectory per profile
    pub data_dir: PathBuf,
    pub default_profile: Profile,
    pub default_top_k: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration from a variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            Some(raw) => expand_path(&raw)?,
            None => default_data_dir()?,
        };

        let default_profile = match lookup(ENV_PROFILE).filter(|v| !v.trim().is_empty()) {
            Some(name) => Profile::new(name.trim())?,
            None => Profile::new(DEFAULT_PROFILE)?,
        };

        let default_top_k = match lookup(ENV_TOP_K) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(k) if k > 0 => k,
                _ => {
                    return Err(VaultError::Config(format!(
                        "{} must be a positive integer, got '{}'",
                        ENV_TOP_K, raw
                    )))
                }
            },
            None => DEFAULT_TOP_K,
        };

        Ok(Config {
            data_dir,
            default_profile,
            default_top_k,
        })
    }
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| VaultError::Config(format!("Cannot expand '{}': {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join("knowledge-vault"));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| VaultError::Config("Could not determine home directory".into()))?;
    Ok(home.join(".knowledge-vault"))
}
