//! Path resolution and directory probing
//!
//! Canonical paths go through `dunce` so Windows callers get plain
//! `C:\...` paths instead of verbatim `\\?\C:\...` ones.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolve a path to its absolute canonical form.
///
/// Fails if the path does not exist.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Confirm that `path` is an existing, readable directory.
///
/// Returns the canonical path on success. Readability is checked by
/// actually opening the directory for listing.
pub async fn probe_readable_dir(path: &Path) -> Result<PathBuf> {
    let canonical = canonicalize(path)?;

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| Error::io(&canonical, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory { path: canonical });
    }

    tokio::fs::read_dir(&canonical)
        .await
        .map_err(|e| Error::io(&canonical, e))?;

    Ok(canonical)
}
