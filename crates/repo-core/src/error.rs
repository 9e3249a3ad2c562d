//! Error types for repo-core

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The process working directory could not be determined
    #[error("Cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    /// Tools error from repo-tools
    #[error(transparent)]
    Tools(#[from] repo_tools::Error),
}

impl From<repo_tools::RegistryError> for Error {
    fn from(e: repo_tools::RegistryError) -> Self {
        Error::Tools(e.into())
    }
}
