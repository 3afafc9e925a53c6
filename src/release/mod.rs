//! Release pipeline stages
//!
//! A run is strictly sequential:
//!
//! 1. **version**: resolve the preview or release version and persist it
//! 2. **changelog**: describe the changes since the previous release
//! 3. **comment**: plan mode only, upsert the preview comment on the PR
//! 4. **publisher**: live only, find-or-create the GitHub release and upload assets
//! 5. **container**: live only, publish container targets in order
//!
//! Stages 4 and 5 are [`mode::Action`]s; [`mode::ReleaseMode::run`] decides
//! whether they execute or only log what they would do.

pub mod artifacts;
pub mod changelog;
pub mod comment;
pub mod container;
pub mod mode;
pub mod publisher;
pub mod version;
pub mod workspace;

pub use version::Specifier;
pub use workspace::GitWorkspace;
