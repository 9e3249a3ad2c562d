//! Error types for repo-tools

use std::path::PathBuf;

use crate::loader::ModuleLocation;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Failure to turn a module location into tools.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing exists at the location; callers treat this as zero tools.
    #[error("Module not found: {location}")]
    NotFound { location: ModuleLocation },

    #[error("Malformed module at {location}: {message}")]
    Malformed {
        location: ModuleLocation,
        message: String,
    },

    #[error("I/O error loading {location}: {source}")]
    Io {
        location: ModuleLocation,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{key}' is already registered")]
    DuplicateKey { key: String },
}

/// Failure raised by a tool handler.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
