//! Shared test fixtures for the repository gateway workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] - `.git` markers, fake or real
//! - [`workspace`] - [`TestWorkspace`] builder for a parent directory full of
//!   fake repositories

pub mod git;
pub mod workspace;

pub use workspace::TestWorkspace;
