//! GitHub REST payloads (only the fields the pipeline reads)

use serde::{Deserialize, Serialize};

/// A release as returned by `GET /repos/{owner}/{repo}/releases/tags/{tag}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
  pub id: u64,
  pub tag_name: String,
  /// RFC 6570 template, e.g. `https://uploads.github.com/.../assets{?name,label}`
  #[serde(default)]
  pub upload_url: String,
}

impl Release {
  /// Upload endpoint with the URI template stripped
  pub fn upload_endpoint(&self) -> &str {
    self.upload_url.split('{').next().unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
  pub id: u64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
  pub id: u64,
  #[serde(default)]
  pub body: Option<String>,
}

impl IssueComment {
  pub fn body(&self) -> &str {
    self.body.as_deref().unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
  pub number: u64,
  pub head: PullRequestHead,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestHead {
  #[serde(rename = "ref")]
  pub ref_name: String,
}

/// Body of `POST /repos/{owner}/{repo}/releases`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
  pub tag_name: String,
  pub name: String,
  pub draft: bool,
  pub prerelease: bool,
  pub generate_release_notes: bool,
}

impl NewRelease {
  /// Published (non-draft, non-prerelease) release named after its tag, with host-generated notes
  pub fn published(tag: &str) -> Self {
    Self {
      tag_name: tag.to_string(),
      name: tag.to_string(),
      draft: false,
      prerelease: false,
      generate_release_notes: true,
    }
  }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
  pub body: &'a str,
}
