//! Filesystem helpers for the repository gateway
//!
//! Provides path canonicalization, readable-directory probing, indicator
//! matching for repository detection, and format-agnostic config loading.

pub mod config;
pub mod error;
pub mod indicator;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use indicator::{Indicator, find_indicator, has_any_indicator};
pub use path::{canonicalize, probe_readable_dir, resolve_against};
