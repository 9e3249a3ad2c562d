//! Error types for the MCP server

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the gateway core
    #[error("core error: {0}")]
    Core(#[from] repo_core::Error),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stdio transport failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be installed
    #[error("logging setup failed: {0}")]
    Logging(String),
}
