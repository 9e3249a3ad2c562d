//! Compiled-in tool modules, one per repository category
//!
//! Categories without a module (`frontend`, `infrastructure`, `unknown`)
//! resolve to "not found", which leaves the repository with the fallback
//! tool.

mod backend;
mod contracts;

use std::sync::Arc;

use repo_meta::RepoCategory;

pub use backend::BackendTools;
pub use contracts::ContractTools;

use crate::loader::ToolProvider;

/// The built-in module for `category`, if there is one.
pub fn module_for(category: RepoCategory) -> Option<Arc<dyn ToolProvider>> {
    match category {
        RepoCategory::Contracts => Some(Arc::new(ContractTools)),
        RepoCategory::Backend => Some(Arc::new(BackendTools)),
        RepoCategory::Frontend | RepoCategory::Infrastructure | RepoCategory::Unknown => None,
    }
}

/// Read and parse a JSON file, treating any failure as absent.
async fn read_json(path: &std::path::Path) -> Option<serde_json::Value> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    serde_json::from_str(&content).ok()
}
