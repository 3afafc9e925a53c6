//! CLI commands for release-tool
//!
//! - **version**: resolve and persist the version for this build
//! - **release**: run the full pipeline (version, changelog, comment, publish)
//!
//! Both commands take the `&ReleaseContext` built once in `main`.

pub mod release;
pub mod version;

pub use release::run_release;
pub use version::run_version;
