//! Core building blocks shared by every command
//!
//! - **config**: `release.toml` parsing and validation
//! - **context**: run context derived once from the CI environment
//! - **error**: error types with exit codes and contextual help
//! - **vcs**: git operations through the system binary (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
