//! File helpers shared by the index and metadata snapshots.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

/// Write `bytes` to `path` through a temporary sibling file that is renamed
/// into place, so a failed write never leaves a truncated snapshot behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| VaultError::persistence(parent, e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| VaultError::persistence(path, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| VaultError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| VaultError::persistence(path, e.error))?;

    Ok(())
}

pub fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| VaultError::persistence(path, e))
}

/// Move a snapshot file out of the way so it is kept for inspection but no
/// longer loaded. Returns the new location, or `None` if the file was absent.
pub fn quarantine(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
    let base = path.file_name().unwrap_or_default().to_os_string();

    // Earlier quarantines from the same second keep their files
    let mut attempt = 0;
    let target = loop {
        let mut name = base.clone();
        if attempt == 0 {
            name.push(format!(".corrupt-{}", stamp));
        } else {
            name.push(format!(".corrupt-{}-{}", stamp, attempt));
        }
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            break candidate;
        }
        attempt += 1;
    };

    std::fs::rename(path, &target).map_err(|e| VaultError::persistence(path, e))?;
    Ok(Some(target))
}
