//! Root tools
//!
//! Registered once per process under bare names. They read the live
//! repository and tool registries, so results reflect the latest refresh.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use repo_tools::{
    InvocationContext, ToolDefinition, ToolError, ToolHandler, ToolRegistry, ToolResult,
    required_str,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;

use crate::registry::RepoRegistry;

/// Depth of the tree reported by `get_repo_info`
pub const FILE_TREE_DEPTH: usize = 2;

/// Shared handles the root tools read from.
pub type SharedRepos = Arc<RwLock<RepoRegistry>>;
pub type SharedTools = Arc<RwLock<ToolRegistry>>;

/// Build the root tool set.
pub fn root_tools(repos: SharedRepos, tools: SharedTools) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_repos",
            "Lists all discovered repositories with metadata",
            ListRepos {
                repos: Arc::clone(&repos),
            },
        ),
        ToolDefinition::new(
            "search_across_repos",
            "Search across all repositories using file system search",
            SearchAcrossRepos {
                repos: Arc::clone(&repos),
            },
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (searches in file names and content)"
                },
                "repoFilter": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional: Limit search to specific repos"
                },
                "fileTypes": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional: Filter by file extensions (e.g., [\"ts\", \"js\"])"
                }
            },
            "required": ["query"]
        })),
        ToolDefinition::new(
            "get_repo_info",
            "Get detailed information about a specific repository",
            GetRepoInfo { repos, tools },
        )
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "repo": { "type": "string", "description": "Repository name" }
            },
            "required": ["repo"]
        })),
    ]
}

#[derive(Serialize)]
struct RepoSummary<'a> {
    name: &'a str,
    path: &'a Path,
    #[serde(rename = "type")]
    category: &'a str,
}

struct ListRepos {
    repos: SharedRepos,
}

#[async_trait]
impl ToolHandler for ListRepos {
    async fn call(&self, _args: Value, _ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let repos = self.repos.read().await;
        let summaries: Vec<_> = repos
            .list()
            .iter()
            .map(|r| RepoSummary {
                name: &r.name,
                path: &r.path,
                category: r.category.as_str(),
            })
            .collect();
        Ok(ToolResult::json(&serde_json::to_value(summaries)?))
    }
}

struct GetRepoInfo {
    repos: SharedRepos,
    tools: SharedTools,
}

#[async_trait]
impl ToolHandler for GetRepoInfo {
    async fn call(&self, args: Value, _ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let name = required_str(&args, "repo")?;
        let Some(repo) = self.repos.read().await.get(name).cloned() else {
            return Ok(ToolResult::error_json(format!(
                "Repository '{name}' not found"
            )));
        };

        let tools: Vec<Value> = self
            .tools
            .read()
            .await
            .by_repo(name)
            .iter()
            .map(|t| json!({ "name": t.name, "description": t.description }))
            .collect();
        let tree = file_tree(repo.path.clone(), FILE_TREE_DEPTH).await;

        Ok(ToolResult::json(&json!({
            "name": repo.name,
            "path": repo.path.display().to_string(),
            "type": repo.category.as_str(),
            "tools": tools,
            "fileStructure": tree,
        })))
    }
}

fn skipped(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}

/// Nested map of names: directories map to their children, files to
/// `"file"`. Unreadable directories are left empty.
fn file_tree(dir: PathBuf, depth: usize) -> Pin<Box<dyn Future<Output = Value> + Send>> {
    Box::pin(async move {
        let mut tree = Map::new();
        if depth == 0 {
            return Value::Object(tree);
        }
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return Value::Object(tree);
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if skipped(&name) {
                continue;
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let node = if is_dir {
                file_tree(entry.path(), depth - 1).await
            } else {
                Value::String("file".into())
            };
            tree.insert(name, node);
        }
        Value::Object(tree)
    })
}

struct SearchAcrossRepos {
    repos: SharedRepos,
}

#[derive(Debug, Serialize, PartialEq)]
struct SearchHit {
    file: String,
    matches: usize,
}

#[async_trait]
impl ToolHandler for SearchAcrossRepos {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let query = required_str(&args, "query")?.to_lowercase();
        if query.is_empty() {
            return Err(ToolError::InvalidArgument {
                name: "query".into(),
                message: "must not be empty".into(),
            });
        }
        let repo_filter = string_list(&args, "repoFilter")?;
        let file_types = string_list(&args, "fileTypes")?;

        let targets: Vec<(String, PathBuf)> = self
            .repos
            .read()
            .await
            .list()
            .iter()
            .filter(|r| repo_filter.as_ref().is_none_or(|f| f.contains(&r.name)))
            .map(|r| (r.name.clone(), r.path.clone()))
            .collect();

        let mut results = Map::new();
        for (name, path) in targets {
            let hits = search_dir(&path, &query, file_types.as_deref()).await;
            if !hits.is_empty() {
                ctx.logger.debug(&format!("{} hits in {name}", hits.len()));
                results.insert(name, serde_json::to_value(hits)?);
            }
        }
        Ok(ToolResult::json(&Value::Object(results)))
    }
}

/// Optional array-of-strings argument.
fn string_list(args: &Value, name: &str) -> Result<Option<Vec<String>>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| ToolError::InvalidArgument {
                    name: name.to_string(),
                    message: "expected an array of strings".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ToolError::InvalidArgument {
            name: name.to_string(),
            message: "expected an array of strings".into(),
        }),
    }
}

/// Case-insensitive search over names and contents below `root`.
///
/// `query` must already be lowercase. A file-name hit counts as one
/// extra match.
async fn search_dir(root: &Path, query: &str, file_types: Option<&[String]>) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };

        let mut children = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if skipped(&name) {
                continue;
            }
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            children.push((name, entry.path(), file_type.is_dir(), file_type.is_file()));
        }
        children.sort();

        let mut subdirs = Vec::new();
        for (name, path, is_dir, is_file) in children {
            if is_dir {
                subdirs.push(path);
                continue;
            }
            if !is_file || !extension_allowed(&path, file_types) {
                continue;
            }
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };

            let name_hit = name.to_lowercase().contains(query);
            let matches = content.to_lowercase().matches(query).count() + usize::from(name_hit);
            if matches > 0 {
                hits.push(SearchHit {
                    file: path.display().to_string(),
                    matches,
                });
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }

    hits
}

fn extension_allowed(path: &Path, file_types: Option<&[String]>) -> bool {
    let Some(types) = file_types else {
        return true;
    };
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    types.iter().any(|t| t.trim_start_matches('.') == ext)
}
