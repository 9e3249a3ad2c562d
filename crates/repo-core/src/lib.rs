//! Repository registry and tool dispatch for the gateway
//!
//! `repo-core` sits between discovery/tool resolution and the protocol
//! server:
//!
//! ```text
//!                   repo-mcp
//!                       |
//!                   repo-core
//!                       |
//!        +--------------+-------------+
//!        |              |             |
//! repo-discovery   repo-tools     repo-meta
//!        |              |             |
//!        +--------- repo-fs ----------+
//! ```

pub mod error;
pub mod gateway;
pub mod registry;
pub mod root_tools;

pub use error::{Error, Result};
pub use gateway::Gateway;
pub use registry::{Environment, RepoRegistry};
pub use root_tools::root_tools;
