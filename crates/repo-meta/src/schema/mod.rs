//! Schema definitions for repositories and tool manifests

pub mod manifest;
pub mod repository;

pub use manifest::{ManifestTool, ToolManifest};
pub use repository::{RepoCategory, RepositoryDescriptor, ToolSourceSpec};
