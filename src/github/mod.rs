//! Code-hosting API access
//!
//! The pipeline talks to the host through [`CodeHost`]; [`GitHubClient`] is the
//! REST implementation used in CI.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::GitHubClient;
pub use types::{NewRelease, Release};

use crate::core::error::ReleaseResult;
use types::{IssueComment, PullRequest, ReleaseAsset};
use std::path::Path;

/// Operations the release stages need from the code host
pub trait CodeHost {
  /// Release for `tag`; `HostError::NotFound` when none exists
  fn get_release_by_tag(&self, tag: &str) -> ReleaseResult<Release>;

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<Release>;

  fn list_release_assets(&self, release: &Release) -> ReleaseResult<Vec<ReleaseAsset>>;

  /// Stream the file at `path` as asset `name`
  fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> ReleaseResult<ReleaseAsset>;

  fn list_issue_comments(&self, number: u64) -> ReleaseResult<Vec<IssueComment>>;

  fn create_comment(&self, number: u64, body: &str) -> ReleaseResult<IssueComment>;

  fn update_comment(&self, comment_id: u64, body: &str) -> ReleaseResult<IssueComment>;

  /// Open pull requests whose head branch is `branch`
  fn list_open_pulls_by_head(&self, branch: &str) -> ReleaseResult<Vec<PullRequest>>;
}
