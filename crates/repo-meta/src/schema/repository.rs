//! Repository descriptor schema
//!
//! A [`RepositoryDescriptor`] is produced by discovery (or explicit
//! configuration) and is the unit the tool pipeline and dispatcher work on.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Best-effort technology label assigned to a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepoCategory {
    /// Smart-contract projects (Foundry, Hardhat, Truffle)
    Contracts,
    /// Server-side JavaScript/TypeScript projects
    Backend,
    /// Browser-side JavaScript/TypeScript projects
    Frontend,
    /// Infrastructure-as-code projects
    Infrastructure,
    #[default]
    Unknown,
}

impl RepoCategory {
    pub const ALL: [RepoCategory; 5] = [
        RepoCategory::Contracts,
        RepoCategory::Backend,
        RepoCategory::Frontend,
        RepoCategory::Infrastructure,
        RepoCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepoCategory::Contracts => "contracts",
            RepoCategory::Backend => "backend",
            RepoCategory::Frontend => "frontend",
            RepoCategory::Infrastructure => "infrastructure",
            RepoCategory::Unknown => "unknown",
        }
    }
}

impl From<&str> for RepoCategory {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "contracts" => RepoCategory::Contracts,
            "backend" => RepoCategory::Backend,
            "frontend" => RepoCategory::Frontend,
            "infrastructure" => RepoCategory::Infrastructure,
            _ => RepoCategory::Unknown,
        }
    }
}

impl From<String> for RepoCategory {
    fn from(s: String) -> Self {
        RepoCategory::from(s.as_str())
    }
}

impl From<RepoCategory> for String {
    fn from(category: RepoCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for RepoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared strategy for obtaining a repository's tools.
///
/// In configuration files this is written as a string (`"builtin"`,
/// `"custom"`, or a path) or a list of such strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawToolSource")]
pub enum ToolSourceSpec {
    /// The category's built-in tool set
    #[default]
    Builtin,
    /// Per-repository or per-category custom module
    Custom,
    /// A single location, relative to the repository or absolute
    ExplicitPath(PathBuf),
    /// Ordered sources whose tools are concatenated
    List(Vec<ToolSourceSpec>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToolSource {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for ToolSourceSpec {
    fn from(s: &str) -> Self {
        match s {
            "builtin" => ToolSourceSpec::Builtin,
            "custom" => ToolSourceSpec::Custom,
            path => ToolSourceSpec::ExplicitPath(PathBuf::from(path)),
        }
    }
}

impl From<RawToolSource> for ToolSourceSpec {
    fn from(raw: RawToolSource) -> Self {
        match raw {
            RawToolSource::One(s) => ToolSourceSpec::from(s.as_str()),
            RawToolSource::Many(items) => ToolSourceSpec::List(
                items
                    .iter()
                    .map(|s| ToolSourceSpec::from(s.as_str()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ToolSourceSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolSourceSpec::Builtin => serializer.serialize_str("builtin"),
            ToolSourceSpec::Custom => serializer.serialize_str("custom"),
            ToolSourceSpec::ExplicitPath(path) => {
                serializer.serialize_str(&path.to_string_lossy())
            }
            ToolSourceSpec::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A validated repository known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    /// Unique key within the repository registry
    pub name: String,
    /// Canonical path to an existing, readable directory
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub category: RepoCategory,
    #[serde(rename = "tools")]
    pub tool_source: ToolSourceSpec,
}

impl RepositoryDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, category: RepoCategory) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            category,
            tool_source: ToolSourceSpec::default(),
        }
    }

    /// Set the tool source (builder pattern).
    pub fn with_tool_source(mut self, tool_source: ToolSourceSpec) -> Self {
        self.tool_source = tool_source;
        self
    }

    /// Descriptor used for global tools invoked outside any repository.
    pub fn root(path: &Path) -> Self {
        Self::new("root", path, RepoCategory::Unknown)
    }
}
