//! Repository registry
//!
//! A refresh rebuilds the registry from scratch, pulling descriptors from
//! these sources in precedence order:
//!
//! 1. Explicit `repos` entries in the configuration
//! 2. Discovery under `discovery.parentPath` (or the working directory)
//!    when discovery is enabled
//! 3. Discovery under the `MULTI_REPO_MCP_REPOS_PATH` root
//! 4. Discovery under the working directory
//!
//! The first source to produce a name keeps it; later duplicates are
//! dropped with a warning.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use repo_discovery::{RepoClassifier, RepoDiscoverer, RepoValidator};
use repo_meta::config::ENV_REPOS_PATH;
use repo_meta::{GatewayConfig, RepoCategory, RepoConfig, RepositoryDescriptor};

use crate::{Error, Result};

/// Process-level inputs to discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Ambient working directory
    pub cwd: PathBuf,
    /// Extra discovery root
    pub repos_path: Option<PathBuf>,
}

impl Environment {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            repos_path: None,
        }
    }

    /// Capture the working directory and `MULTI_REPO_MCP_REPOS_PATH`.
    pub fn from_process() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(Error::WorkingDirectory)?;
        let repos_path = std::env::var_os(ENV_REPOS_PATH)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Ok(Self { cwd, repos_path })
    }

    pub fn with_repos_path(mut self, path: Option<PathBuf>) -> Self {
        self.repos_path = path;
        self
    }
}

/// Name-to-descriptor lookup, in registration order.
#[derive(Debug, Default)]
pub struct RepoRegistry {
    repos: Vec<RepositoryDescriptor>,
    index: HashMap<String, usize>,
    discoverer: RepoDiscoverer,
}

impl RepoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discoverer(discoverer: RepoDiscoverer) -> Self {
        Self {
            discoverer,
            ..Self::default()
        }
    }

    /// Clear and repopulate from every source. Returns the repository count.
    pub async fn refresh(&mut self, config: &GatewayConfig, env: &Environment) -> usize {
        tracing::info!("Starting repository discovery");
        self.clear();

        let candidates = self.collect(config, env).await;
        for repo in candidates {
            if self.index.contains_key(&repo.name) {
                tracing::warn!(repo = %repo.name, path = ?repo.path, "Skipping duplicate repository");
                continue;
            }
            tracing::info!(repo = %repo.name, category = %repo.category, path = ?repo.path, "Registered repository");
            self.index.insert(repo.name.clone(), self.repos.len());
            self.repos.push(repo);
        }

        tracing::info!(count = self.repos.len(), "Discovery complete");
        self.repos.len()
    }

    async fn collect(&self, config: &GatewayConfig, env: &Environment) -> Vec<RepositoryDescriptor> {
        let mut found = Vec::new();

        if !config.repos.is_empty() {
            tracing::info!(count = config.repos.len(), "Repositories in configuration");
        }
        for entry in &config.repos {
            if let Some(repo) = self.configured(entry, config, env).await {
                found.push(repo);
            }
        }

        let mut scanned = HashSet::new();
        let mut roots: Vec<(PathBuf, bool)> = Vec::new();
        if config.discovery.enabled {
            let root = match &config.discovery.parent_path {
                Some(parent) => repo_fs::resolve_against(&env.cwd, parent),
                None => env.cwd.clone(),
            };
            roots.push((root, config.discovery.auto_detect_type));
        }
        if let Some(path) = &env.repos_path {
            roots.push((repo_fs::resolve_against(&env.cwd, path), true));
        }
        roots.push((env.cwd.clone(), true));

        for (root, classify) in roots {
            if !scanned.insert(scan_key(&root)) {
                tracing::debug!(root = ?root, "Discovery root already scanned");
                continue;
            }
            tracing::info!(root = ?root, "Scanning for repositories");
            found.extend(self.discoverer.discover(&root, classify).await);
        }

        found
    }

    /// Validate one configured entry, classifying it when no category is set.
    async fn configured(
        &self,
        entry: &RepoConfig,
        config: &GatewayConfig,
        env: &Environment,
    ) -> Option<RepositoryDescriptor> {
        let path = repo_fs::resolve_against(&env.cwd, &entry.path);
        let candidate = RepositoryDescriptor::new(&entry.name, path, RepoCategory::Unknown)
            .with_tool_source(entry.tools.clone().unwrap_or_default());
        let mut repo = self.validator().resolve(candidate).await?;

        repo.category = match entry.category {
            Some(category) => category,
            None if config.discovery.auto_detect_type => self.classifier().classify(&repo.path).await,
            None => RepoCategory::Unknown,
        };
        Some(repo)
    }

    fn validator(&self) -> &RepoValidator {
        self.discoverer.validator()
    }

    fn classifier(&self) -> &RepoClassifier {
        self.discoverer.classifier()
    }

    /// All repositories in registration order.
    pub fn list(&self) -> &[RepositoryDescriptor] {
        &self.repos
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryDescriptor> {
        self.index.get(name).map(|&i| &self.repos[i])
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn clear(&mut self) {
        self.repos.clear();
        self.index.clear();
    }
}

fn scan_key(root: &Path) -> PathBuf {
    repo_fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
