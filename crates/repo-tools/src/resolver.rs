//! Tool-source resolution pipeline
//!
//! Turns a repository's [`ToolSourceSpec`] into concrete tools:
//!
//! - `Builtin` loads the category module
//! - `Custom` probes `custom/<repo>/` then `custom/<category>/` under the
//!   custom tools directory, `tools.toml` before `tools.json`
//! - `ExplicitPath` loads one location relative to the repository
//! - `List` resolves each element in order and concatenates
//!
//! A missing location contributes nothing. Any other load failure aborts
//! resolution for the repository. Either way, a repository that ends up
//! with no tools gets the `list_files` fallback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use repo_meta::{RepositoryDescriptor, ToolSourceSpec};

use crate::error::LoadError;
use crate::fallback::fallback_tool;
use crate::loader::{
    DefaultPluginLoader, MANIFEST_FILE_NAMES, ModuleCache, ModuleLocation, PluginLoader,
};
use crate::tool::ToolDefinition;

/// Sub-directory of the custom tools directory holding per-repo and
/// per-category modules
pub const CUSTOM_SUBDIR: &str = "custom";

/// Resolves repositories to tools through a plugin loader and module cache.
pub struct ToolResolver {
    loader: Arc<dyn PluginLoader>,
    cache: ModuleCache,
    custom_dir: PathBuf,
}

impl ToolResolver {
    /// `custom_dir` should be absolute.
    pub fn new(loader: Arc<dyn PluginLoader>, custom_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            cache: ModuleCache::new(),
            custom_dir: custom_dir.into(),
        }
    }

    pub fn with_default_loader(custom_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DefaultPluginLoader::new()), custom_dir)
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    pub fn custom_dir(&self) -> &Path {
        &self.custom_dir
    }

    /// Resolve the tools for `repo`, stamped with its name.
    ///
    /// Never empty: failures and empty sources yield the fallback tool.
    pub async fn resolve_tools(&self, repo: &RepositoryDescriptor) -> Vec<ToolDefinition> {
        let tools = match self.load_sources(repo).await {
            Ok(tools) => tools,
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "Tool resolution failed");
                Vec::new()
            }
        };

        if tools.is_empty() {
            tracing::warn!(repo = %repo.name, "No tools found, using fallback");
            return vec![fallback_tool(&repo.name)];
        }

        tracing::info!(repo = %repo.name, count = tools.len(), "Resolved repository tools");
        tools
            .into_iter()
            .map(|tool| tool.with_repo(repo.name.as_str()))
            .collect()
    }

    /// Load every declared source without fallback or stamping.
    pub async fn load_sources(
        &self,
        repo: &RepositoryDescriptor,
    ) -> Result<Vec<ToolDefinition>, LoadError> {
        let mut sources = Vec::new();
        flatten(&repo.tool_source, &mut sources);

        let mut tools: Vec<ToolDefinition> = Vec::new();
        let mut origins: HashMap<String, String> = HashMap::new();
        for source in sources {
            let label = source_label(source);
            for tool in self.load_source(source, repo).await? {
                if let Some(kept) = origins.get(&tool.name) {
                    tracing::warn!(
                        repo = %repo.name,
                        tool = %tool.name,
                        %kept,
                        dropped = %label,
                        "Tool declared by more than one source, keeping the first"
                    );
                    continue;
                }
                origins.insert(tool.name.clone(), label.clone());
                tools.push(tool);
            }
        }
        Ok(tools)
    }

    async fn load_source(
        &self,
        source: &ToolSourceSpec,
        repo: &RepositoryDescriptor,
    ) -> Result<Vec<ToolDefinition>, LoadError> {
        match source {
            ToolSourceSpec::Builtin => {
                self.load_or_empty(&ModuleLocation::Builtin(repo.category), repo)
                    .await
            }
            ToolSourceSpec::Custom => {
                for location in self.custom_locations(repo) {
                    match self.load_location(&location, repo).await {
                        Ok(tools) => {
                            tracing::info!(repo = %repo.name, %location, count = tools.len(), "Loaded custom tools");
                            return Ok(tools);
                        }
                        Err(e) if e.is_not_found() => continue,
                        Err(e) => return Err(e),
                    }
                }
                tracing::debug!(repo = %repo.name, "No custom tools found (checked repo name and category)");
                Ok(Vec::new())
            }
            ToolSourceSpec::ExplicitPath(path) => {
                let location = explicit_location(&repo.path, path).await;
                self.load_or_empty(&location, repo).await
            }
            // flattened away before we get here
            ToolSourceSpec::List(_) => Ok(Vec::new()),
        }
    }

    /// Probe order for `Custom`: repository name first, then category.
    pub fn custom_locations(&self, repo: &RepositoryDescriptor) -> Vec<ModuleLocation> {
        let base = self.custom_dir.join(CUSTOM_SUBDIR);
        let mut locations = Vec::new();
        for dir in [repo.name.as_str(), repo.category.as_str()] {
            for file in MANIFEST_FILE_NAMES {
                locations.push(ModuleLocation::File(base.join(dir).join(file)));
            }
        }
        locations
    }

    async fn load_or_empty(
        &self,
        location: &ModuleLocation,
        repo: &RepositoryDescriptor,
    ) -> Result<Vec<ToolDefinition>, LoadError> {
        match self.load_location(location, repo).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(repo = %repo.name, %location, "Tool module not found");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn load_location(
        &self,
        location: &ModuleLocation,
        repo: &RepositoryDescriptor,
    ) -> Result<Vec<ToolDefinition>, LoadError> {
        let module = self
            .cache
            .get_or_load(location, self.loader.as_ref())
            .await?;
        module.tools(&repo.path).await
    }
}

/// Short name of a single source for diagnostics.
fn source_label(source: &ToolSourceSpec) -> String {
    match source {
        ToolSourceSpec::Builtin => "builtin".to_string(),
        ToolSourceSpec::Custom => "custom".to_string(),
        ToolSourceSpec::ExplicitPath(path) => path.display().to_string(),
        ToolSourceSpec::List(_) => "list".to_string(),
    }
}

/// Depth-first flattening of nested source lists.
fn flatten<'a>(spec: &'a ToolSourceSpec, out: &mut Vec<&'a ToolSourceSpec>) {
    match spec {
        ToolSourceSpec::List(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        other => out.push(other),
    }
}

/// Resolve an explicit source against the repository. A directory stands
/// for the first manifest inside it.
async fn explicit_location(repo_path: &Path, path: &Path) -> ModuleLocation {
    let full = repo_fs::resolve_against(repo_path, path);
    let is_dir = tokio::fs::metadata(&full)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    if is_dir {
        for name in MANIFEST_FILE_NAMES {
            let candidate = full.join(name);
            if tokio::fs::metadata(&candidate).await.is_ok() {
                return ModuleLocation::File(candidate);
            }
        }
        return ModuleLocation::File(full.join(MANIFEST_FILE_NAMES[0]));
    }
    ModuleLocation::File(full)
}
