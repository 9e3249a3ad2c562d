//! Gateway configuration types
//!
//! Every field has a built-in default, so a configuration file only needs
//! to mention what it overrides. `repos` is replaced wholesale; the
//! `discovery` and `tools` sections are merged key by key.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema::{RepoCategory, ToolSourceSpec};

/// Directory holding gateway configuration and custom tools
pub const CONFIG_DIR_NAME: &str = ".multi-repo-mcp";

/// Configuration file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "repos.json";

/// Environment variable naming an explicit configuration file
pub const ENV_CONFIG_PATH: &str = "MULTI_REPO_MCP_CONFIG";

/// Environment variable naming an additional discovery root
pub const ENV_REPOS_PATH: &str = "MULTI_REPO_MCP_REPOS_PATH";

/// Complete gateway configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Explicitly configured repositories, highest discovery precedence
    pub repos: Vec<RepoConfig>,
    pub discovery: DiscoveryConfig,
    pub tools: ToolsConfig,
}

/// An explicitly configured repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub name: String,
    /// Relative paths resolve against the working directory
    pub path: PathBuf,
    /// Classified automatically when absent
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<RepoCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolSourceSpec>,
}

/// Auto-discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    pub enabled: bool,
    /// Root to scan; the working directory when absent
    pub parent_path: Option<PathBuf>,
    pub auto_detect_type: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            parent_path: None,
            auto_detect_type: true,
        }
    }
}

/// Tool loading behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolsConfig {
    /// Defer per-repository tool resolution until first use
    pub lazy_load: bool,
    /// Accepted for compatibility; results are never cached
    pub cache_results: bool,
    /// Root of `custom/<repo-or-category>/tools.{toml,json}`
    pub custom_dir: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            lazy_load: true,
            cache_results: true,
            custom_dir: PathBuf::from(CONFIG_DIR_NAME).join("tools"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config.repos.is_empty());
        assert!(config.discovery.enabled);
        assert!(config.discovery.auto_detect_type);
        assert!(config.discovery.parent_path.is_none());
        assert!(config.tools.lazy_load);
        assert!(config.tools.cache_results);
        assert_eq!(
            config.tools.custom_dir,
            PathBuf::from(".multi-repo-mcp/tools")
        );
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"discovery":{"parentPath":"/work"},"tools":{"lazyLoad":false}}"#,
        )
        .unwrap();

        assert!(config.discovery.enabled);
        assert_eq!(config.discovery.parent_path, Some(PathBuf::from("/work")));
        assert!(!config.tools.lazy_load);
        assert!(config.tools.cache_results);
    }

    #[test]
    fn test_repo_entry_accepts_type_alias() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"repos":[{"name":"svc","path":"../svc","type":"backend","tools":"custom"}]}"#,
        )
        .unwrap();

        let repo = &config.repos[0];
        assert_eq!(repo.category, Some(RepoCategory::Backend));
        assert_eq!(repo.tools, Some(ToolSourceSpec::Custom));
    }

    #[test]
    fn test_repo_entry_minimal() {
        let config: GatewayConfig =
            toml::from_str("[[repos]]\nname = \"web\"\npath = \"/work/web\"\n").unwrap();
        assert_eq!(config.repos[0].category, None);
        assert_eq!(config.repos[0].tools, None);
    }
}
