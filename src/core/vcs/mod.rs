pub mod system_git;

pub use system_git::SystemGit;

/// A commit as seen by changelog and version analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
  pub sha: String,
  pub message: String,
}
