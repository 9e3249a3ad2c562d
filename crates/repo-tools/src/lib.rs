//! Tools for the repository gateway
//!
//! - [`tool`] - the tool model shared by every layer
//! - [`registry`] - namespaced `repo:tool` registry
//! - [`loader`] - plugin-loader capability and module cache
//! - [`resolver`] - tool-source resolution with fallback synthesis
//! - [`builtin`] - compiled-in category tool sets
//! - [`fallback`] - the `list_files` fallback tool

pub mod builtin;
pub mod error;
pub mod fallback;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod tool;

pub use error::{Error, LoadError, RegistryError, Result, ToolError};
pub use fallback::{FALLBACK_TOOL_NAME, fallback_tool};
pub use loader::{
    DefaultPluginLoader, LoadedModule, ModuleCache, ModuleLocation, PluginLoader, ToolProvider,
};
pub use registry::ToolRegistry;
pub use resolver::ToolResolver;
pub use tool::{
    InvocationContext, ResourceRef, ToolContent, ToolDefinition, ToolDescriptor, ToolHandler,
    ToolLogger, ToolResult, optional_str, required_str, split_key, tool_key,
};
