//! GitHub release publishing
//!
//! Ensures exactly one release exists for `v<version>` and uploads the
//! packaged assets to it. Reruns skip assets already attached; nothing is
//! rolled back when an upload fails midway.

use crate::core::error::ReleaseResult;
use crate::github::{CodeHost, NewRelease, Release};
use crate::release::artifacts::{asset_name, collect_release_assets, verify_checksums};
use crate::release::mode::Action;
use std::collections::HashSet;
use std::path::PathBuf;

/// Summary of one publish run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishReport {
  pub created_release: bool,
  pub uploaded: Vec<String>,
  pub skipped: Vec<String>,
}

/// Find-or-create the release, then upload every asset
pub struct PublishRelease<'a> {
  host: &'a dyn CodeHost,
  tag: String,
  assets_dir: PathBuf,
}

impl<'a> PublishRelease<'a> {
  pub fn new(host: &'a dyn CodeHost, tag: impl Into<String>, assets_dir: impl Into<PathBuf>) -> Self {
    Self {
      host,
      tag: tag.into(),
      assets_dir: assets_dir.into(),
    }
  }

  /// Existing release for the tag, or a freshly created one
  fn find_or_create(&self) -> ReleaseResult<(Release, bool)> {
    match self.host.get_release_by_tag(&self.tag) {
      Ok(release) => {
        println!("   Found existing release {} (id {})", release.tag_name, release.id);
        Ok((release, false))
      }
      Err(e) if e.is_not_found() => {
        let release = self.host.create_release(&NewRelease::published(&self.tag))?;
        println!("   Created release {} (id {})", release.tag_name, release.id);
        Ok((release, true))
      }
      Err(e) => Err(e),
    }
  }

  pub fn publish(&self) -> ReleaseResult<PublishReport> {
    println!("🚀 Publishing release {}...", self.tag);

    let assets = collect_release_assets(&self.assets_dir)?;
    let verified = verify_checksums(&self.assets_dir)?;
    if verified > 0 {
      println!("   Verified {} checksum(s)", verified);
    }

    let (release, created_release) = self.find_or_create()?;

    let existing: HashSet<String> = self
      .host
      .list_release_assets(&release)?
      .into_iter()
      .map(|asset| asset.name)
      .collect();

    let mut report = PublishReport {
      created_release,
      ..PublishReport::default()
    };

    for path in &assets {
      let name = asset_name(path);
      if existing.contains(&name) {
        println!("   ⏭️  {} already uploaded", name);
        report.skipped.push(name);
        continue;
      }

      let asset = self.host.upload_asset(&release, &name, path)?;
      println!("   ✅ Uploaded {} (asset {})", name, asset.id);
      report.uploaded.push(name);
    }

    if assets.is_empty() {
      println!("   No assets found in {}", self.assets_dir.display());
    }
    tracing::info!(
      tag = %self.tag,
      created = report.created_release,
      uploaded = report.uploaded.len(),
      skipped = report.skipped.len(),
      "release published"
    );
    Ok(report)
  }
}

impl Action for PublishRelease<'_> {
  fn describe(&self) -> String {
    format!("publish release {} with assets from {}", self.tag, self.assets_dir.display())
  }

  fn execute(&self) -> ReleaseResult<()> {
    self.publish().map(|_| ())
  }
}
