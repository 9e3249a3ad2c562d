//! Fallback tool for repositories that resolve to nothing

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::tool::{InvocationContext, ToolDefinition, ToolHandler, ToolResult, optional_str};

pub const FALLBACK_TOOL_NAME: &str = "list_files";

/// The `list_files` tool for repository `repo_name`, stamped with the repo.
pub fn fallback_tool(repo_name: &str) -> ToolDefinition {
    ToolDefinition::new(
        FALLBACK_TOOL_NAME,
        format!("List files in {repo_name} repository"),
        ListFiles,
    )
    .with_input_schema(json!({
        "type": "object",
        "properties": {
            "directory": {
                "type": "string",
                "description": "Directory to list, relative to the repository root"
            }
        }
    }))
    .with_repo(repo_name)
}

struct ListFiles;

#[async_trait]
impl ToolHandler for ListFiles {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let dir = match optional_str(&args, "directory")? {
            Some(d) => within_repo(&ctx.repo_path, d).await?,
            None => ctx.repo_path.clone(),
        };

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| ToolError::io(&dir, e))?;

        let mut listing = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ToolError::io(&dir, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            listing.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        listing.sort();

        let items: Vec<Value> = listing
            .into_iter()
            .map(|(name, is_dir)| {
                json!({ "name": name, "type": if is_dir { "directory" } else { "file" } })
            })
            .collect();
        Ok(ToolResult::json(&Value::Array(items)))
    }
}

/// Resolve `directory` under `root`, refusing anything that lands outside it.
async fn within_repo(root: &Path, directory: &str) -> Result<PathBuf, ToolError> {
    let outside = || ToolError::InvalidArgument {
        name: "directory".to_string(),
        message: format!("'{directory}' is outside the repository"),
    };

    let requested = Path::new(directory);
    if requested
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(outside());
    }

    // symlinks inside the repo may still point elsewhere
    let joined = root.join(requested);
    let canonical = tokio::fs::canonicalize(&joined)
        .await
        .map_err(|e| ToolError::io(&joined, e))?;
    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| ToolError::io(root, e))?;
    if !canonical.starts_with(&canonical_root) {
        return Err(outside());
    }
    Ok(canonical)
}
