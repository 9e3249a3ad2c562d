//! Backend tools: route lookup

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{LoadError, ToolError};
use crate::loader::ToolProvider;
use crate::tool::{InvocationContext, ToolDefinition, ToolHandler, ToolResult, required_str};

/// Directories searched for route handlers, in order
const ROUTE_DIRS: &[&str] = &["src/routes", "src/api", "routes", "api", "server/routes"];

const SOURCE_EXTENSIONS: &[&str] = &["ts", "js"];

/// Tool set for `backend` repositories
#[derive(Debug, Default, Clone, Copy)]
pub struct BackendTools;

#[async_trait]
impl ToolProvider for BackendTools {
    async fn load_tools(&self, _repo_path: &Path) -> Result<Vec<ToolDefinition>, LoadError> {
        Ok(vec![
            ToolDefinition::new(
                "get_api_endpoint",
                "Get API endpoint configuration from the backend repository",
                GetApiEndpoint,
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "endpoint": {
                        "type": "string",
                        "description": "Endpoint path (e.g., /api/users)"
                    }
                },
                "required": ["endpoint"]
            })),
        ])
    }
}

struct GetApiEndpoint;

#[async_trait]
impl ToolHandler for GetApiEndpoint {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let endpoint = required_str(&args, "endpoint")?;
        let last_segment = endpoint.rsplit('/').find(|s| !s.is_empty());

        for dir in ROUTE_DIRS {
            for file in source_files(&ctx.repo_path.join(dir)).await {
                let Ok(content) = tokio::fs::read_to_string(&file).await else {
                    continue;
                };
                let hit = content.contains(endpoint)
                    || last_segment.is_some_and(|seg| content.contains(seg));
                if hit {
                    return Ok(ToolResult::json(&json!({
                        "file": file.display().to_string(),
                        "endpoint": endpoint,
                        "found": true,
                    })));
                }
            }
        }

        Ok(ToolResult::error_json(format!("Endpoint {endpoint} not found")))
    }
}

/// `.ts` / `.js` files under `root`, depth-first in name order.
///
/// A missing or unreadable directory contributes nothing.
async fn source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };

        let mut children = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            children.push((entry.path(), is_dir));
        }
        children.sort();

        let mut subdirs = Vec::new();
        for (path, is_dir) in children {
            if is_dir {
                subdirs.push(path);
            } else if has_source_extension(&path) {
                files.push(path);
            }
        }
        // reversed so the first subdirectory is visited next
        stack.extend(subdirs.into_iter().rev());
    }

    files
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_meta::{RepoCategory, RepositoryDescriptor};
    use tempfile::TempDir;

    fn ctx(dir: &Path) -> InvocationContext {
        let repo = RepositoryDescriptor::new("api", dir, RepoCategory::Backend);
        InvocationContext::new(repo, "api:get_api_endpoint")
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn parsed(result: &ToolResult) -> Value {
        serde_json::from_str(&result.text_content()).unwrap()
    }

    #[tokio::test]
    async fn test_finds_endpoint_in_nested_routes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/routes/health.ts", "router.get('/health')");
        write(temp.path(), "src/routes/v1/users.ts", "router.get('/api/users', list)");
        write(temp.path(), "src/routes/v1/users.md", "/api/users docs");

        let result = GetApiEndpoint
            .call(json!({ "endpoint": "/api/users" }), &ctx(temp.path()))
            .await
            .unwrap();

        let body = parsed(&result);
        assert!(!result.is_error);
        assert_eq!(body["found"], true);
        assert!(body["file"].as_str().unwrap().ends_with("users.ts"));
    }

    #[tokio::test]
    async fn test_matches_last_segment() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "routes/orders.js", "app.use('orders', handler)");

        let result = GetApiEndpoint
            .call(json!({ "endpoint": "/v2/orders" }), &ctx(temp.path()))
            .await
            .unwrap();
        assert!(parsed(&result)["file"].as_str().unwrap().ends_with("orders.js"));
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_error_result() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "api/index.ts", "export {}");

        let result = GetApiEndpoint
            .call(json!({ "endpoint": "/api/ghost" }), &ctx(temp.path()))
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(parsed(&result)["error"], "Endpoint /api/ghost not found");
    }

    #[tokio::test]
    async fn test_source_files_order() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.ts", "");
        write(temp.path(), "a/z.js", "");
        write(temp.path(), "a.ts", "");

        let files: Vec<_> = source_files(temp.path())
            .await
            .into_iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![PathBuf::from("a.ts"), PathBuf::from("b.ts"), PathBuf::from("a/z.js")]
        );
    }
}
