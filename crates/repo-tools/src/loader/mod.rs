//! Plugin loading
//!
//! A [`PluginLoader`] turns a [`ModuleLocation`] into a [`LoadedModule`].
//! Built-in category modules are compiled in; file locations are tool
//! manifests whose tools run external commands. Loaded modules are kept
//! in a [`ModuleCache`] for the life of the process.

mod cache;
mod manifest;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use repo_meta::RepoCategory;

pub use cache::ModuleCache;
pub use manifest::{CommandHandler, ENV_TOOL_ARGS, MANIFEST_FILE_NAMES, load_manifest};

use crate::builtin;
use crate::error::LoadError;
use crate::tool::ToolDefinition;

/// Resolved load location; also the module cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleLocation {
    /// Compiled-in tool set for a category
    Builtin(RepoCategory),
    /// Tool manifest on disk (absolute path)
    File(PathBuf),
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleLocation::Builtin(category) => write!(f, "builtin:{category}"),
            ModuleLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Produces tools for a given repository path.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn load_tools(&self, repo_path: &Path) -> Result<Vec<ToolDefinition>, LoadError>;
}

/// What a location yields once loaded.
#[derive(Clone)]
pub enum LoadedModule {
    /// Tools computed per repository
    Provider(Arc<dyn ToolProvider>),
    /// Fixed tool list
    Static(Vec<ToolDefinition>),
}

impl LoadedModule {
    /// Tools this module contributes for `repo_path`.
    pub async fn tools(&self, repo_path: &Path) -> Result<Vec<ToolDefinition>, LoadError> {
        match self {
            LoadedModule::Provider(provider) => provider.load_tools(repo_path).await,
            LoadedModule::Static(tools) => Ok(tools.clone()),
        }
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedModule::Provider(_) => f.write_str("LoadedModule::Provider"),
            LoadedModule::Static(tools) => f.debug_tuple("LoadedModule::Static").field(tools).finish(),
        }
    }
}

/// Capability that loads a module from a location.
#[async_trait]
pub trait PluginLoader: Send + Sync {
    async fn load(&self, location: &ModuleLocation) -> Result<LoadedModule, LoadError>;
}

/// Built-in category modules plus manifest files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPluginLoader;

impl DefaultPluginLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginLoader for DefaultPluginLoader {
    async fn load(&self, location: &ModuleLocation) -> Result<LoadedModule, LoadError> {
        match location {
            ModuleLocation::Builtin(category) => builtin::module_for(*category)
                .map(LoadedModule::Provider)
                .ok_or_else(|| LoadError::NotFound {
                    location: location.clone(),
                }),
            ModuleLocation::File(path) => load_manifest(path).await,
        }
    }
}
