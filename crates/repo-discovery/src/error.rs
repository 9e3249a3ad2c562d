//! Error types for repo-discovery

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    #[error("Failed to read manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}
