//! Repository path validation

use std::path::PathBuf;

use repo_meta::RepositoryDescriptor;

/// Confirms that a descriptor points at an existing, readable directory.
///
/// Failures are reported through `tracing` and never returned to the
/// caller: an invalid candidate is simply dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepoValidator;

impl RepoValidator {
    pub fn new() -> Self {
        Self
    }

    /// True if the descriptor's path is a readable directory.
    pub async fn validate(&self, repo: &RepositoryDescriptor) -> bool {
        self.canonical_path(repo).await.is_some()
    }

    /// Validate and return a copy of the descriptor with its path replaced
    /// by the canonical absolute form.
    pub async fn resolve(&self, repo: RepositoryDescriptor) -> Option<RepositoryDescriptor> {
        let path = self.canonical_path(&repo).await?;
        Some(RepositoryDescriptor { path, ..repo })
    }

    async fn canonical_path(&self, repo: &RepositoryDescriptor) -> Option<PathBuf> {
        match repo_fs::probe_readable_dir(&repo.path).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "Repository failed validation");
                None
            }
        }
    }
}
