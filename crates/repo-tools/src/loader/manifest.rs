//! Manifest plugins
//!
//! A manifest (`tools.toml` or `tools.json`) declares tools backed by
//! external commands. Each command runs with the repository as its working
//! directory and receives the call arguments as JSON on stdin. Payloads up
//! to [`ENV_TOOL_ARGS_MAX`] bytes are also exported in [`ENV_TOOL_ARGS`].
//! Standard output becomes the text result; a non-zero exit is a tool error
//! carrying standard error.

use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use repo_fs::ConfigStore;
use repo_meta::{ManifestTool, ToolManifest};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{LoadedModule, ModuleLocation};
use crate::error::{LoadError, ToolError};
use crate::tool::{InvocationContext, ToolDefinition, ToolHandler, ToolResult};

/// Environment variable carrying the JSON-encoded call arguments
pub const ENV_TOOL_ARGS: &str = "MULTI_REPO_MCP_TOOL_ARGS";

/// Largest payload exported through [`ENV_TOOL_ARGS`]; larger ones are
/// only available on stdin. Stays well under the per-string exec limit.
pub const ENV_TOOL_ARGS_MAX: usize = 32 * 1024;

/// Manifest file names probed inside a directory, in order
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["tools.toml", "tools.json"];

/// Load a manifest file into a static tool list.
pub async fn load_manifest(path: &Path) -> Result<LoadedModule, LoadError> {
    let location = ModuleLocation::File(path.to_path_buf());

    let manifest: ToolManifest = match ConfigStore::new().load_async(path).await {
        Ok(manifest) => manifest,
        Err(e) if e.is_not_found() => return Err(LoadError::NotFound { location }),
        Err(repo_fs::Error::Io { source, .. }) => return Err(LoadError::Io { location, source }),
        Err(e) => {
            return Err(LoadError::Malformed {
                location,
                message: e.to_string(),
            });
        }
    };

    let mut seen = HashSet::new();
    let mut tools = Vec::with_capacity(manifest.tools.len());
    for entry in manifest.tools {
        if entry.command.trim().is_empty() {
            return Err(LoadError::Malformed {
                location,
                message: format!("tool '{}' has an empty command", entry.name),
            });
        }
        if !seen.insert(entry.name.clone()) {
            return Err(LoadError::Malformed {
                location,
                message: format!("tool '{}' is declared twice", entry.name),
            });
        }
        tools.push(command_tool(entry));
    }

    tracing::debug!(path = ?path, count = tools.len(), "Loaded tool manifest");
    Ok(LoadedModule::Static(tools))
}

fn command_tool(entry: ManifestTool) -> ToolDefinition {
    let handler = CommandHandler {
        command: entry.command,
        args: entry.args,
    };
    let tool = ToolDefinition::new(entry.name, entry.description, handler);
    match entry.input_schema {
        Some(schema) => tool.with_input_schema(schema),
        None => tool,
    }
}

/// Runs an external command for a manifest tool.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    pub command: String,
    pub args: Vec<String>,
}

#[async_trait]
impl ToolHandler for CommandHandler {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let payload = serde_json::to_string(&args)?;
        ctx.logger.debug(&format!("Running {} {:?}", self.command, self.args));

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .current_dir(&ctx.repo_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if payload.len() <= ENV_TOOL_ARGS_MAX {
            command.env(ENV_TOOL_ARGS, &payload);
        } else {
            ctx.logger.debug(&format!(
                "Payload of {} bytes passed on stdin only",
                payload.len()
            ));
        }

        let mut child = command
            .spawn()
            .map_err(|e| ToolError::Failed(format!("Failed to start '{}': {e}", self.command)))?;

        // Feed stdin while draining stdout/stderr so neither side can fill
        // its pipe and stall the other.
        let stdin = child.stdin.take();
        let feed = async {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(payload.as_bytes()).await {
                // the command may exit without reading its input
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output.map_err(|e| ToolError::io(&ctx.repo_path, e))?;
        fed.map_err(|e| ToolError::io(&ctx.repo_path, e))?;

        if output.status.success() {
            Ok(ToolResult::text(String::from_utf8_lossy(&output.stdout)))
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ToolError::Failed(format!(
                "Command '{}' exited with code {code}: {}",
                self.command,
                stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use repo_meta::{RepoCategory, RepositoryDescriptor};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_toml_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.toml");
        std::fs::write(
            &path,
            "[[tools]]\nname = \"greet\"\ndescription = \"Say hi\"\ncommand = \"echo\"\nargs = [\"hi\"]\n",
        )
        .unwrap();

        let LoadedModule::Static(tools) = load_manifest(&path).await.unwrap() else {
            panic!("expected a static module");
        };
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "greet");
        assert_eq!(tools[0].description, "Say hi");
        assert!(tools[0].repo.is_none());
    }

    #[tokio::test]
    async fn test_missing_manifest_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_manifest(&temp.path().join("tools.json")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_broken_manifest_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.json");
        std::fs::write(&path, "{ \"tools\": [ { \"name\": 1 } ] }").unwrap();

        let err = load_manifest(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_tool_names_are_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.toml");
        std::fs::write(
            &path,
            "[[tools]]\nname = \"a\"\ncommand = \"true\"\n\n[[tools]]\nname = \"a\"\ncommand = \"true\"\n",
        )
        .unwrap();

        let err = load_manifest(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Malformed { ref message, .. } if message.contains("twice")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runs_in_repo_with_args() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:probe");

        let handler = CommandHandler {
            command: "sh".into(),
            args: vec![
                "-c".into(),
                format!("ls; printf '%s' \"${ENV_TOOL_ARGS}\""),
            ],
        };
        let result = handler
            .call(serde_json::json!({ "q": "x" }), &ctx)
            .await
            .unwrap();

        let text = result.text_content();
        assert!(!result.is_error);
        assert!(text.contains("marker.txt"));
        assert!(text.contains(r#"{"q":"x"}"#));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_reads_args_from_stdin() {
        let temp = TempDir::new().unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:cat");

        let handler = CommandHandler {
            command: "cat".into(),
            args: vec![],
        };
        let result = handler
            .call(serde_json::json!({ "n": 1 }), &ctx)
            .await
            .unwrap();
        assert_eq!(result.text_content(), r#"{"n":1}"#);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_error_with_stderr() {
        let temp = TempDir::new().unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:fail");

        let handler = CommandHandler {
            command: "sh".into(),
            args: vec!["-c".into(), "echo broken >&2; exit 3".into()],
        };
        let err = handler.call(serde_json::json!({}), &ctx).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("code 3"));
        assert!(message.contains("broken"));
    }

    #[cfg(unix)]
    #[rstest::rstest]
    #[case::env_sized(16 * 1024)]
    #[case::pipe_sized(120 * 1024)]
    #[case::over_exec_limit(200 * 1024)]
    #[tokio::test]
    async fn test_large_payload_with_large_output(#[case] blob_len: usize) {
        let temp = TempDir::new().unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:bulk");

        // fills the stdout pipe before touching stdin
        let handler = CommandHandler {
            command: "sh".into(),
            args: vec![
                "-c".into(),
                "head -c 200000 /dev/zero; wc -c >&2".into(),
            ],
        };
        let args = serde_json::json!({ "blob": "x".repeat(blob_len) });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            handler.call(args, &ctx),
        )
        .await
        .expect("command stalled")
        .unwrap();

        assert_eq!(result.text_content().len(), 200_000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_args_omitted_above_limit() {
        let temp = TempDir::new().unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:env");

        let handler = CommandHandler {
            command: "sh".into(),
            args: vec![
                "-c".into(),
                format!("cat >/dev/null; printf '%s' \"${{{ENV_TOOL_ARGS}:-unset}}\""),
            ],
        };
        let args = serde_json::json!({ "blob": "x".repeat(ENV_TOOL_ARGS_MAX) });

        let result = handler.call(args, &ctx).await.unwrap();
        assert_eq!(result.text_content(), "unset");
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let temp = TempDir::new().unwrap();
        let repo = RepositoryDescriptor::new("svc", temp.path(), RepoCategory::Backend);
        let ctx = InvocationContext::new(repo, "svc:ghost");

        let handler = CommandHandler {
            command: "definitely-not-a-real-program-7c1f".into(),
            args: vec![],
        };
        let err = handler.call(serde_json::json!({}), &ctx).await.unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }
}
