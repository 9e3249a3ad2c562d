//! MCP server for the multi-repository tool gateway
//!
//! Exposes a [`repo_core::Gateway`] to MCP clients (Claude Desktop, IDE
//! agents) as one flat tool list:
//!
//! ```text
//! [ MCP Client ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ repo-mcp (GatewayServer) ]
//!        |
//!        v
//! [ repo-core (Gateway) ] --> repositories, tool registry
//! ```
//!
//! Tool names are either bare (`list_repos`) or namespaced by repository
//! (`api:get_api_endpoint`).

pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;

pub use error::{Error, Result};
pub use server::GatewayServer;
