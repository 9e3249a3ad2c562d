//! Indicator patterns for repository detection
//!
//! An indicator is a marker file or directory that must be present directly
//! inside a candidate directory. Patterns use a tiny syntax:
//!
//! - `package.json` - an entry with exactly this name (file or directory)
//! - `terraform/` - a directory with this name
//! - `hardhat.config.*` - a file whose name starts with `hardhat.config.`

use std::path::{Path, PathBuf};

/// Parsed form of an indicator pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator<'a> {
    /// Any entry with this exact name
    Entry(&'a str),
    /// A directory with this exact name
    Dir(&'a str),
    /// A file whose name starts with this prefix
    Prefix(&'a str),
}

impl<'a> Indicator<'a> {
    pub fn parse(pattern: &'a str) -> Self {
        if let Some(dir) = pattern.strip_suffix('/') {
            Indicator::Dir(dir)
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Indicator::Prefix(prefix)
        } else {
            Indicator::Entry(pattern)
        }
    }
}

/// Look for `pattern` directly inside `dir`.
///
/// Returns the matching path, or `None` if nothing matches or the directory
/// cannot be read. Prefix matches are resolved in sorted name order so the
/// result is stable across platforms.
pub async fn find_indicator(dir: &Path, pattern: &str) -> Option<PathBuf> {
    match Indicator::parse(pattern) {
        Indicator::Entry(name) => {
            let candidate = dir.join(name);
            tokio::fs::metadata(&candidate).await.ok().map(|_| candidate)
        }
        Indicator::Dir(name) => {
            let candidate = dir.join(name);
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_dir() => Some(candidate),
                _ => None,
            }
        }
        Indicator::Prefix(prefix) => {
            let mut entries = tokio::fs::read_dir(dir).await.ok()?;
            let mut matches = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name();
                let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                if is_file && name.to_string_lossy().starts_with(prefix) {
                    matches.push(entry.path());
                }
            }
            matches.sort();
            matches.into_iter().next()
        }
    }
}

/// True if any of `patterns` matches inside `dir`.
pub async fn has_any_indicator(dir: &Path, patterns: &[&str]) -> bool {
    for pattern in patterns {
        if find_indicator(dir, pattern).await.is_some() {
            return true;
        }
    }
    false
}
