//! Dispatch gateway
//!
//! Ties the repository registry, tool resolution and the tool registry
//! together behind two requests: list tools and call tool.
//!
//! Repository tools are resolved lazily, the first time a call names the
//! repository, unless `tools.lazyLoad` is off. Two calls racing on the same
//! unloaded repository both resolve, but only the first registers; the
//! second sees the repository's tools already present under the write lock
//! and drops its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use repo_meta::{GatewayConfig, RepositoryDescriptor};
use repo_tools::{
    InvocationContext, RegistryError, ToolDefinition, ToolDescriptor, ToolRegistry, ToolResolver,
    ToolResult, split_key,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::Result;
use crate::registry::{Environment, RepoRegistry};
use crate::root_tools::root_tools;

pub struct Gateway {
    config: GatewayConfig,
    env: Environment,
    repos: Arc<RwLock<RepoRegistry>>,
    tools: Arc<RwLock<ToolRegistry>>,
    resolver: ToolResolver,
    root_tools_loaded: AtomicBool,
}

impl Gateway {
    /// Gateway using the default plugin loader. The custom tools directory
    /// is resolved against the working directory.
    pub fn new(config: GatewayConfig, env: Environment) -> Self {
        let custom_dir = repo_fs::resolve_against(&env.cwd, &config.tools.custom_dir);
        let resolver = ToolResolver::with_default_loader(custom_dir);
        Self::with_resolver(config, env, resolver)
    }

    pub fn with_resolver(config: GatewayConfig, env: Environment, resolver: ToolResolver) -> Self {
        Self {
            config,
            env,
            repos: Arc::new(RwLock::new(RepoRegistry::new())),
            tools: Arc::new(RwLock::new(ToolRegistry::new())),
            resolver,
            root_tools_loaded: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Discover repositories, register root tools and, when lazy loading
    /// is off, resolve every repository's tools.
    pub async fn initialize(&self) -> Result<()> {
        tracing::info!("Initializing gateway");
        self.refresh_repos().await;
        self.load_root_tools().await?;

        if !self.config.tools.lazy_load {
            let names: Vec<String> = self
                .repos
                .read()
                .await
                .list()
                .iter()
                .map(|r| r.name.clone())
                .collect();
            for name in names {
                self.ensure_repo_tools(&name).await?;
            }
        }

        tracing::info!(tools = self.tools.read().await.len(), "Gateway initialized");
        Ok(())
    }

    /// Rebuild the repository registry. Returns the repository count.
    pub async fn refresh_repos(&self) -> usize {
        self.repos
            .write()
            .await
            .refresh(&self.config, &self.env)
            .await
    }

    /// Register the root tools. Only the first call does anything.
    pub async fn load_root_tools(&self) -> Result<usize> {
        if self
            .root_tools_loaded
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(0);
        }

        let tools = root_tools(Arc::clone(&self.repos), Arc::clone(&self.tools));
        let count = tools.len();
        let mut registry = self.tools.write().await;
        for tool in tools {
            registry.register_tool(tool)?;
        }
        tracing::info!(count, "Loaded root tools");
        Ok(count)
    }

    /// Public descriptors of every registered tool. Never triggers loading.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .await
            .all()
            .into_iter()
            .map(ToolDefinition::descriptor)
            .collect()
    }

    pub async fn repositories(&self) -> Vec<RepositoryDescriptor> {
        self.repos.read().await.list().to_vec()
    }

    /// Resolve and register `repo`'s tools unless it already has some.
    ///
    /// Returns how many tools this call registered; unknown repositories
    /// and already-loaded ones yield 0.
    pub async fn ensure_repo_tools(&self, repo: &str) -> Result<usize> {
        let Some(descriptor) = self.repos.read().await.get(repo).cloned() else {
            tracing::debug!(repo, "No such repository");
            return Ok(0);
        };
        if self.tools.read().await.has_repo_tools(repo) {
            return Ok(0);
        }

        let resolved = self.resolver.resolve_tools(&descriptor).await;

        let mut registry = self.tools.write().await;
        if registry.has_repo_tools(repo) {
            tracing::debug!(repo, "Tools registered concurrently, discarding");
            return Ok(0);
        }

        let mut count = 0;
        for tool in resolved {
            match registry.register_tool(tool) {
                Ok(()) => count += 1,
                Err(RegistryError::DuplicateKey { key }) => {
                    tracing::warn!(repo, %key, "Tool key already registered, keeping the first");
                }
            }
        }
        tracing::info!(repo, count, "Loaded repository tools");
        Ok(count)
    }

    /// Drop `repo`'s tools and resolve them again.
    pub async fn reload_repo_tools(&self, repo: &str) -> Result<usize> {
        let removed = self.tools.write().await.unregister_repo(repo);
        tracing::info!(repo, removed, "Reloading repository tools");
        self.ensure_repo_tools(repo).await
    }

    /// Dispatch a call. Every outcome is a [`ToolResult`]; failures set
    /// the error flag.
    pub async fn call_tool(&self, name: &str, args: Value) -> ToolResult {
        let (repo_name, _) = split_key(name);

        let mut tool = self.tools.read().await.get(name).cloned();
        if tool.is_none() {
            if let Some(repo) = repo_name {
                if let Err(e) = self.ensure_repo_tools(repo).await {
                    tracing::warn!(repo, error = %e, "Failed to load repository tools");
                }
                tool = self.tools.read().await.get(name).cloned();
            }
        }

        let Some(tool) = tool else {
            return ToolResult::error_json(format!("Tool '{name}' not found"));
        };

        let repo = match repo_name {
            Some(repo) => self.repos.read().await.get(repo).cloned(),
            None => None,
        }
        .unwrap_or_else(|| RepositoryDescriptor::root(&self.env.cwd));

        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        let ctx = InvocationContext::new(repo, name);
        let handler = Arc::clone(&tool.handler);

        let task = tokio::spawn(async move { handler.call(args, &ctx).await });
        match task.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!(tool = name, error = %e, "Tool execution error");
                ToolResult::error_json(e.to_string())
            }
            Err(e) => {
                tracing::error!(tool = name, error = %e, "Tool handler aborted");
                ToolResult::error_json(format!("Tool '{name}' failed unexpectedly"))
            }
        }
    }
}
