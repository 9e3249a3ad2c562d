//! Repository discovery under a parent directory

use std::path::Path;

use repo_meta::{RepoCategory, RepositoryDescriptor};

use crate::{RepoClassifier, RepoValidator, Result};

/// Entries whose presence marks a directory as a repository
pub const REPO_INDICATORS: &[&str] = &[
    ".git",
    "package.json",
    "foundry.toml",
    "hardhat.config.js",
    "hardhat.config.ts",
    "truffle-config.js",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
];

/// Scans the immediate children of a directory for repositories.
#[derive(Debug, Clone, Default)]
pub struct RepoDiscoverer {
    classifier: RepoClassifier,
    validator: RepoValidator,
}

impl RepoDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: RepoClassifier) -> Self {
        Self {
            classifier,
            validator: RepoValidator::new(),
        }
    }

    pub fn classifier(&self) -> &RepoClassifier {
        &self.classifier
    }

    pub fn validator(&self) -> &RepoValidator {
        &self.validator
    }

    /// Discover repositories directly under `root`.
    ///
    /// Results are sorted by directory name. An unreadable `root` yields an
    /// empty list and a warning.
    pub async fn discover(&self, root: &Path, classify: bool) -> Vec<RepositoryDescriptor> {
        match self.scan(root, classify).await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::warn!(root = ?root, error = %e, "Failed to discover repositories");
                Vec::new()
            }
        }
    }

    async fn scan(&self, root: &Path, classify: bool) -> Result<Vec<RepositoryDescriptor>> {
        let mut entries = tokio::fs::read_dir(root)
            .await
            .map_err(|e| repo_fs::Error::io(root, e))?;

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| repo_fs::Error::io(root, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                candidates.push(entry);
            }
        }
        candidates.sort_by_key(|e| e.file_name());

        let mut repos = Vec::new();
        for entry in candidates {
            let path = entry.path();
            if !repo_fs::has_any_indicator(&path, REPO_INDICATORS).await {
                continue;
            }

            let category = if classify {
                self.classifier.classify(&path).await
            } else {
                RepoCategory::Unknown
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let candidate = RepositoryDescriptor::new(name, path, category);

            if let Some(repo) = self.validator.resolve(candidate).await {
                tracing::debug!(repo = %repo.name, category = %repo.category, "Discovered repository");
                repos.push(repo);
            }
        }

        Ok(repos)
    }
}
