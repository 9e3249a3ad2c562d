//! Tool registry storage

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::tool::ToolDefinition;

/// Central registry of callable tools.
///
/// Queries are pure reads; nothing here triggers loading.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tool` under `key`.
    ///
    /// An already-present key is rejected and the registry is left unchanged.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        tool: ToolDefinition,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        if self.tools.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }
        self.tools.insert(key, tool);
        Ok(())
    }

    /// Register under the tool's own namespaced key.
    pub fn register_tool(&mut self, tool: ToolDefinition) -> Result<(), RegistryError> {
        let key = tool.key();
        self.register(key, tool)
    }

    pub fn get(&self, key: &str) -> Option<&ToolDefinition> {
        self.tools.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.tools.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All registered keys (sorted).
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.tools.keys().map(|k| k.as_str()).collect();
        keys.sort();
        keys
    }

    /// All registered tools, ordered by key.
    pub fn all(&self) -> Vec<&ToolDefinition> {
        let mut entries: Vec<_> = self.tools.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, tool)| tool).collect()
    }

    /// Tools owned by repository `repo`, ordered by key.
    pub fn by_repo(&self, repo: &str) -> Vec<&ToolDefinition> {
        let mut entries: Vec<_> = self
            .tools
            .iter()
            .filter(|(_, t)| t.repo.as_deref() == Some(repo))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, tool)| tool).collect()
    }

    /// True if at least one tool is owned by `repo`.
    pub fn has_repo_tools(&self, repo: &str) -> bool {
        self.tools.values().any(|t| t.repo.as_deref() == Some(repo))
    }

    pub fn unregister(&mut self, key: &str) -> Option<ToolDefinition> {
        self.tools.remove(key)
    }

    /// Remove every tool owned by `repo`, returning how many were removed.
    pub fn unregister_repo(&mut self, repo: &str) -> usize {
        let before = self.tools.len();
        self.tools.retain(|_, t| t.repo.as_deref() != Some(repo));
        before - self.tools.len()
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }
}
