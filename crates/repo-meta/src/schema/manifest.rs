//! Tool manifest schema - loaded from `tools.toml` / `tools.json`
//!
//! A manifest declares command-backed tools for a repository. Each tool runs
//! an external program with the repository as its working directory.
//!
//! # Example TOML
//!
//! ```toml
//! [[tools]]
//! name = "run_tests"
//! description = "Run the test suite"
//! command = "cargo"
//! args = ["test", "--quiet"]
//!
//! [tools.input_schema]
//! type = "object"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Complete manifest loaded from disk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub tools: Vec<ManifestTool>,
}

/// A single command-backed tool
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "input_schema")]
    pub input_schema: Option<Value>,
    /// Program to execute
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_manifest() {
        let manifest: ToolManifest = toml::from_str(
            r#"
[[tools]]
name = "run_tests"
description = "Run the test suite"
command = "cargo"
args = ["test"]

[tools.input_schema]
type = "object"
"#,
        )
        .unwrap();

        assert_eq!(manifest.tools.len(), 1);
        let tool = &manifest.tools[0];
        assert_eq!(tool.name, "run_tests");
        assert_eq!(tool.command, "cargo");
        assert_eq!(tool.args, vec!["test"]);
        assert_eq!(tool.input_schema.as_ref().unwrap()["type"], "object");
    }

    #[test]
    fn test_parse_json_manifest_camel_case() {
        let manifest: ToolManifest = serde_json::from_str(
            r#"{"tools":[{"name":"lint","command":"npm","args":["run","lint"],"inputSchema":{"type":"object"}}]}"#,
        )
        .unwrap();

        let tool = &manifest.tools[0];
        assert_eq!(tool.description, "");
        assert!(tool.input_schema.is_some());
    }

    #[test]
    fn test_missing_command_is_rejected() {
        let result: Result<ToolManifest, _> =
            serde_json::from_str(r#"{"tools":[{"name":"lint"}]}"#);
        assert!(result.is_err());
    }
}
