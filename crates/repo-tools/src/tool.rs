//! Tool model
//!
//! A [`ToolDefinition`] pairs public metadata with an async [`ToolHandler`].
//! Handlers receive the call arguments and a fresh [`InvocationContext`]
//! and return a [`ToolResult`], the same shape the protocol layer sends
//! back to clients.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use repo_meta::RepositoryDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Separator between repository name and tool name in registry keys
pub const KEY_SEPARATOR: char = ':';

/// Registry key for a tool: `repo:name` when repo-bound, else `name`.
pub fn tool_key(repo: Option<&str>, name: &str) -> String {
    match repo {
        Some(repo) => format!("{repo}{KEY_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Split a registry key at the first separator into `(repo, name)`.
///
/// Bare keys have no repository part.
pub fn split_key(key: &str) -> (Option<&str>, &str) {
    match key.split_once(KEY_SEPARATOR) {
        Some((repo, name)) => (Some(repo), name),
        None => (None, key),
    }
}

/// Operation behind a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError>;
}

/// A callable, schema-described tool.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Option<Value>,
    pub handler: Arc<dyn ToolHandler>,
    /// Owning repository; `None` for root tools
    pub repo: Option<String>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            handler: Arc::new(handler),
            repo: None,
        }
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Stamp the owning repository.
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Namespaced registry key.
    pub fn key(&self) -> String {
        tool_key(self.repo.as_deref(), &self.name)
    }

    /// Public metadata exposed to clients.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.key(),
            description: self.description.clone(),
            input_schema: self
                .input_schema
                .clone()
                .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} })),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("repo", &self.repo)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Tool metadata as listed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Per-call context, built fresh for every invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Repository path, or the working directory for root tools
    pub repo_path: PathBuf,
    pub repo: RepositoryDescriptor,
    pub logger: ToolLogger,
}

impl InvocationContext {
    pub fn new(repo: RepositoryDescriptor, tool_key: impl Into<String>) -> Self {
        let logger = ToolLogger::new(tool_key, &repo.name);
        Self {
            repo_path: repo.path.clone(),
            repo,
            logger,
        }
    }
}

/// Logging capability handed to tool handlers.
///
/// Events carry the tool key and repository name as fields.
#[derive(Debug, Clone)]
pub struct ToolLogger {
    tool: String,
    repo: String,
}

impl ToolLogger {
    pub fn new(tool: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            repo: repo.into(),
        }
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(tool = %self.tool, repo = %self.repo, "{message}");
    }

    pub fn info(&self, message: &str) {
        tracing::info!(tool = %self.tool, repo = %self.repo, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(tool = %self.tool, repo = %self.repo, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(tool = %self.tool, repo = %self.repo, "{message}");
    }
}

/// Result from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

/// Content parts of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: ResourceRef,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: false,
        }
    }

    /// Create a successful result holding pretty-printed JSON
    pub fn json(value: &Value) -> Self {
        Self::text(pretty(value))
    }

    /// Create an error result with a plain message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }

    /// Create an error result shaped as `{"error": message}`
    pub fn error_json(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::json(&serde_json::json!({ "error": message.into() }))
        }
    }

    /// Concatenated text parts.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Fetch a required string argument.
pub fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::InvalidArgument {
            name: name.to_string(),
            message: "expected a string".into(),
        }),
        None => Err(ToolError::MissingArgument(name.to_string())),
    }
}

/// Fetch an optional string argument; `null` counts as absent.
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ToolError::InvalidArgument {
            name: name.to_string(),
            message: "expected a string".into(),
        }),
    }
}
