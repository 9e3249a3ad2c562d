//! Repository descriptors and gateway configuration.
//!
//! This crate holds the types shared by discovery, tool resolution and
//! dispatch, plus the layered configuration loader.

pub mod config;
pub mod error;
pub mod loader;
pub mod schema;

pub use config::{DiscoveryConfig, GatewayConfig, RepoConfig, ToolsConfig};
pub use error::{Error, Result};
pub use loader::{ConfigLoader, ConfigSource, LoadedConfig};
pub use schema::{ManifestTool, RepoCategory, RepositoryDescriptor, ToolManifest, ToolSourceSpec};
