//! Repository discovery for the gateway
//!
//! Three stages, each usable on its own:
//!
//! - [`RepoValidator`] confirms a descriptor points at a readable directory
//! - [`RepoClassifier`] assigns a [`RepoCategory`](repo_meta::RepoCategory)
//!   from an ordered rule table
//! - [`RepoDiscoverer`] scans a parent directory for repository-looking
//!   children and runs the other two stages on them

pub mod classifier;
pub mod discoverer;
pub mod error;
pub mod validator;

pub use classifier::{ClassificationRule, ContentCheck, DEFAULT_RULES, RepoClassifier};
pub use discoverer::{REPO_INDICATORS, RepoDiscoverer};
pub use error::{Error, Result};
pub use validator::RepoValidator;
