//! Namespaced tool registry
//!
//! Keys are `repo:tool` for repository tools and the bare tool name for
//! root tools. A key can only be registered once.

mod store;

pub use store::ToolRegistry;
