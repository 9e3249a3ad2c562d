//! Layered configuration lookup
//!
//! Sources are tried in order and the first one that yields a valid file
//! wins; its content is merged over the built-in defaults:
//!
//! 1. `./.multi-repo-mcp/repos.json` (project-local)
//! 2. `~/.multi-repo-mcp/repos.json` (user home)
//! 3. The file named by `MULTI_REPO_MCP_CONFIG`
//! 4. Built-in defaults
//!
//! Any of the files may also be TOML or YAML when the path says so.

use std::fmt;
use std::path::{Path, PathBuf};

use repo_fs::ConfigStore;

use crate::config::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CONFIG_PATH, GatewayConfig};
use crate::{Error, Result};

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Local(PathBuf),
    Home(PathBuf),
    Env(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Local(p) => write!(f, "local file {}", p.display()),
            ConfigSource::Home(p) => write!(f, "home file {}", p.display()),
            ConfigSource::Env(p) => write!(f, "{} file {}", ENV_CONFIG_PATH, p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Effective configuration plus its origin
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GatewayConfig,
    pub source: ConfigSource,
}

/// Resolves configuration from the layered sources
pub struct ConfigLoader {
    cwd: PathBuf,
    home_dir: Option<PathBuf>,
    env_config: Option<PathBuf>,
    store: ConfigStore,
}

impl ConfigLoader {
    /// Create a loader rooted at `cwd`, reading the home directory and
    /// `MULTI_REPO_MCP_CONFIG` from the process environment.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            home_dir: dirs::home_dir(),
            env_config: std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
            store: ConfigStore::new(),
        }
    }

    /// Override the home directory (used for testing).
    pub fn with_home_dir(mut self, home: Option<PathBuf>) -> Self {
        self.home_dir = home;
        self
    }

    /// Override the environment-named configuration file.
    pub fn with_env_config(mut self, path: Option<PathBuf>) -> Self {
        self.env_config = path;
        self
    }

    /// Candidate file sources in precedence order.
    pub fn candidates(&self) -> Vec<ConfigSource> {
        let mut sources = vec![ConfigSource::Local(
            self.cwd.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        )];
        if let Some(home) = &self.home_dir {
            sources.push(ConfigSource::Home(
                home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            ));
        }
        if let Some(env) = &self.env_config {
            sources.push(ConfigSource::Env(repo_fs::resolve_against(&self.cwd, env)));
        }
        sources
    }

    /// Resolve the effective configuration. Never fails: unusable layers
    /// are skipped and the defaults are the last resort.
    pub fn load(&self) -> LoadedConfig {
        for source in self.candidates() {
            let path = match &source {
                ConfigSource::Local(p) | ConfigSource::Home(p) | ConfigSource::Env(p) => p,
                ConfigSource::Defaults => continue,
            };

            match self.load_file(path) {
                Ok(Some(config)) => {
                    tracing::info!(%source, "Configuration loaded");
                    return LoadedConfig { config, source };
                }
                Ok(None) => {
                    if matches!(source, ConfigSource::Env(_)) {
                        tracing::warn!(path = ?path, "Configuration named by environment does not exist");
                    }
                }
                Err(e) => {
                    if matches!(source, ConfigSource::Env(_)) {
                        tracing::warn!(path = ?path, error = %e, "Failed to load config from environment");
                    } else {
                        tracing::debug!(path = ?path, error = %e, "Config source failed");
                    }
                }
            }
        }

        tracing::info!("Using default configuration");
        LoadedConfig {
            config: GatewayConfig::default(),
            source: ConfigSource::Defaults,
        }
    }

    /// Load a single configuration file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load_file(&self, path: &Path) -> Result<Option<GatewayConfig>> {
        match self.store.load::<GatewayConfig>(path) {
            Ok(config) => Ok(Some(config)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(repo_fs::Error::ConfigParse { path, message, .. }) => {
                Err(Error::InvalidConfig { path, message })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    fn isolated_loader(cwd: &Path) -> ConfigLoader {
        ConfigLoader::new(cwd)
            .with_home_dir(None)
            .with_env_config(None)
    }

    #[test]
    fn test_defaults_when_nothing_exists() {
        let cwd = TempDir::new().unwrap();
        let loaded = isolated_loader(cwd.path()).load();
        assert_eq!(loaded.source, ConfigSource::Defaults);
        assert_eq!(loaded.config, GatewayConfig::default());
    }

    #[test]
    fn test_local_wins_over_home() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let local = write_config(cwd.path(), r#"{"tools":{"lazyLoad":false}}"#);
        write_config(home.path(), r#"{"tools":{"lazyLoad":true,"cacheResults":false}}"#);

        let loaded = isolated_loader(cwd.path())
            .with_home_dir(Some(home.path().to_path_buf()))
            .load();

        assert_eq!(loaded.source, ConfigSource::Local(local));
        assert!(!loaded.config.tools.lazy_load);
        // home values are not blended in
        assert!(loaded.config.tools.cache_results);
    }

    #[test]
    fn test_invalid_local_falls_through_to_home() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        write_config(cwd.path(), "{ broken");
        let home_file = write_config(home.path(), r#"{"discovery":{"enabled":false}}"#);

        let loaded = isolated_loader(cwd.path())
            .with_home_dir(Some(home.path().to_path_buf()))
            .load();

        assert_eq!(loaded.source, ConfigSource::Home(home_file));
        assert!(!loaded.config.discovery.enabled);
    }

    #[test]
    fn test_env_file_used_last() {
        let cwd = TempDir::new().unwrap();
        let env_file = cwd.path().join("gateway.toml");
        fs::write(&env_file, "[tools]\nlazyLoad = false\n").unwrap();

        let loaded = isolated_loader(cwd.path())
            .with_env_config(Some(PathBuf::from("gateway.toml")))
            .load();

        assert_eq!(loaded.source, ConfigSource::Env(env_file));
        assert!(!loaded.config.tools.lazy_load);
    }

    #[test]
    fn test_missing_env_file_yields_defaults() {
        let cwd = TempDir::new().unwrap();
        let loaded = isolated_loader(cwd.path())
            .with_env_config(Some(cwd.path().join("nope.json")))
            .load();
        assert_eq!(loaded.source, ConfigSource::Defaults);
    }

    #[test]
    fn test_load_file_reports_invalid_config() {
        let cwd = TempDir::new().unwrap();
        let path = write_config(cwd.path(), r#"{"repos": 5}"#);

        let err = isolated_loader(cwd.path()).load_file(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_candidates_order() {
        let cwd = TempDir::new().unwrap();
        let loader = ConfigLoader::new(cwd.path())
            .with_home_dir(Some(PathBuf::from("/home/dev")))
            .with_env_config(Some(PathBuf::from("/etc/gateway.json")));

        let candidates = loader.candidates();
        assert_eq!(candidates.len(), 3);
        assert!(matches!(candidates[0], ConfigSource::Local(_)));
        assert!(matches!(candidates[1], ConfigSource::Home(_)));
        assert!(matches!(candidates[2], ConfigSource::Env(_)));
    }
}
