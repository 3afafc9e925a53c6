//! In-memory [`CodeHost`] for unit tests

use super::CodeHost;
use super::types::{IssueComment, NewRelease, PullRequest, PullRequestHead, Release, ReleaseAsset};
use crate::core::error::{HostError, ReleaseError, ReleaseResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Default)]
pub struct FakeHost {
  pub releases: RefCell<Vec<Release>>,
  pub assets: RefCell<BTreeMap<u64, Vec<ReleaseAsset>>>,
  pub comments: RefCell<BTreeMap<u64, Vec<IssueComment>>>,
  pub pulls: Vec<PullRequest>,
  /// Release lookups and every mutating call, in order: `get_release`, `create_release`, `upload:<name>`,
  /// `create_comment`, `update_comment`
  pub calls: RefCell<Vec<String>>,
  /// Fail every request with HTTP 500
  pub broken: bool,
  next_id: Cell<u64>,
}

impl FakeHost {
  pub fn with_pulls(pulls: &[(u64, &str)]) -> Self {
    Self {
      pulls: pulls
        .iter()
        .map(|(number, head)| PullRequest {
          number: *number,
          head: PullRequestHead {
            ref_name: head.to_string(),
          },
        })
        .collect(),
      ..Self::default()
    }
  }

  pub fn broken() -> Self {
    Self {
      broken: true,
      ..Self::default()
    }
  }

  pub fn add_release(&self, tag: &str) -> Release {
    let release = Release {
      id: self.id(),
      tag_name: tag.to_string(),
      upload_url: format!("https://uploads.test/releases/{}/assets{{?name,label}}", tag),
    };
    self.releases.borrow_mut().push(release.clone());
    release
  }

  pub fn add_asset(&self, release: &Release, name: &str) {
    let asset = ReleaseAsset {
      id: self.id(),
      name: name.to_string(),
    };
    self.assets.borrow_mut().entry(release.id).or_default().push(asset);
  }

  pub fn add_comment(&self, number: u64, body: &str) {
    let comment = IssueComment {
      id: self.id(),
      body: Some(body.to_string()),
    };
    self.comments.borrow_mut().entry(number).or_default().push(comment);
  }

  pub fn comments_on(&self, number: u64) -> Vec<IssueComment> {
    self.comments.borrow().get(&number).cloned().unwrap_or_default()
  }

  pub fn count_calls(&self, prefix: &str) -> usize {
    self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
  }

  fn id(&self) -> u64 {
    let id = self.next_id.get() + 1;
    self.next_id.set(id);
    id
  }

  fn check(&self, method: &str, url: &str) -> ReleaseResult<()> {
    if self.broken {
      return Err(ReleaseError::Host(HostError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status: 500,
        body: "boom".to_string(),
      }));
    }
    Ok(())
  }
}

impl CodeHost for FakeHost {
  fn get_release_by_tag(&self, tag: &str) -> ReleaseResult<Release> {
    self.check("GET", "releases/tags")?;
    self.calls.borrow_mut().push("get_release".to_string());
    self
      .releases
      .borrow()
      .iter()
      .find(|r| r.tag_name == tag)
      .cloned()
      .ok_or_else(|| {
        ReleaseError::Host(HostError::NotFound {
          resource: format!("releases/tags/{}", tag),
        })
      })
  }

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<Release> {
    self.check("POST", "releases")?;
    self.calls.borrow_mut().push("create_release".to_string());
    Ok(self.add_release(&release.tag_name))
  }

  fn list_release_assets(&self, release: &Release) -> ReleaseResult<Vec<ReleaseAsset>> {
    self.check("GET", "assets")?;
    Ok(self.assets.borrow().get(&release.id).cloned().unwrap_or_default())
  }

  fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> ReleaseResult<ReleaseAsset> {
    self.check("POST", "assets")?;
    assert!(path.is_file(), "uploaded path must exist: {}", path.display());
    self.calls.borrow_mut().push(format!("upload:{}", name));
    self.add_asset(release, name);
    Ok(ReleaseAsset {
      id: self.next_id.get(),
      name: name.to_string(),
    })
  }

  fn list_issue_comments(&self, number: u64) -> ReleaseResult<Vec<IssueComment>> {
    self.check("GET", "comments")?;
    Ok(self.comments_on(number))
  }

  fn create_comment(&self, number: u64, body: &str) -> ReleaseResult<IssueComment> {
    self.check("POST", "comments")?;
    self.calls.borrow_mut().push("create_comment".to_string());
    self.add_comment(number, body);
    Ok(IssueComment {
      id: self.next_id.get(),
      body: Some(body.to_string()),
    })
  }

  fn update_comment(&self, comment_id: u64, body: &str) -> ReleaseResult<IssueComment> {
    self.check("PATCH", "comments")?;
    self.calls.borrow_mut().push("update_comment".to_string());
    let mut comments = self.comments.borrow_mut();
    let comment = comments
      .values_mut()
      .flatten()
      .find(|c| c.id == comment_id)
      .ok_or_else(|| {
        ReleaseError::Host(HostError::NotFound {
          resource: format!("issues/comments/{}", comment_id),
        })
      })?;
    comment.body = Some(body.to_string());
    Ok(comment.clone())
  }

  fn list_open_pulls_by_head(&self, branch: &str) -> ReleaseResult<Vec<PullRequest>> {
    self.check("GET", "pulls")?;
    Ok(self.pulls.iter().filter(|p| p.head.ref_name == branch).cloned().collect())
  }
}
