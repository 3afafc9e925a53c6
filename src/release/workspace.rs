//! Git-backed workspace versioning
//!
//! Implements [`VersionSource`] on top of `v<semver>` tags and conventional
//! commits:
//! - latest release = highest stable `v*` tag
//! - bump = major for breaking, minor for `feat`, patch for anything else
//! - commit/tag mode writes the manifest version and CHANGELOG.md, then
//!   commits and tags `v<version>`

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::core::vcs::{CommitInfo, SystemGit};
use crate::release::changelog::{Changelog, CommitType, ConventionalCommit};
use crate::release::version::{ChangelogOutput, Specifier, VersionBump, VersionRequest, VersionSource};
use semver::Version;
use std::fs;
use std::path::{Path, PathBuf};

/// Tag name for a release version
pub fn release_tag(version: &Version) -> String {
  format!("v{}", version)
}

/// Versioning driven by the repository's git history
pub struct GitWorkspace {
  root: PathBuf,
  initial_version: String,
  changelog_path: PathBuf,
}

impl GitWorkspace {
  pub fn new(ctx: &ReleaseContext) -> Self {
    Self {
      root: ctx.root().to_path_buf(),
      initial_version: ctx.config.version.initial_version.clone(),
      changelog_path: ctx.config.version.changelog.clone(),
    }
  }

  fn manifest_path(&self) -> PathBuf {
    self.root.join("Cargo.toml")
  }

  /// Version used when no release tag exists yet
  fn base_version(&self) -> ReleaseResult<Version> {
    if let Some(version) = read_manifest_version(&self.manifest_path())? {
      return Ok(version);
    }
    Ok(Version::parse(&self.initial_version)?)
  }

  /// Commits since the latest release tag below `before` (any tag when None), together with that tag
  fn history(
    &self,
    git: &SystemGit,
    before: Option<&Version>,
  ) -> ReleaseResult<(Option<(String, Version)>, Vec<CommitInfo>)> {
    let last = latest_release_tag(git, before)?;
    let commits = git.commits_since(last.as_ref().map(|(tag, _)| tag.as_str()))?;
    tracing::debug!(
      last_tag = ?last.as_ref().map(|(t, _)| t),
      head = ?commits.first().map(|c| c.sha.as_str()),
      commits = commits.len(),
      "history"
    );
    Ok((last, commits))
  }

  fn next_version(
    &self,
    request: &VersionRequest,
    last: Option<&Version>,
    commits: &[CommitInfo],
  ) -> ReleaseResult<Option<Version>> {
    let next = match (&request.specifier, last) {
      (Some(Specifier::Exact(version)), _) => Some(version.clone()),
      (Some(Specifier::Bump(bump)), Some(last)) => Some(bump.apply(last)),
      (Some(Specifier::Bump(bump)), None) => Some(bump.apply(&self.base_version()?)),
      (None, None) if request.first_release => Some(self.base_version()?),
      (None, None) => None,
      (None, Some(last)) => match determine_bump(commits) {
        VersionBump::None if request.first_release => Some(last.clone()),
        VersionBump::None => None,
        bump => Some(bump.apply(last)),
      },
    };
    Ok(next)
  }

  /// Write manifest + changelog, commit, tag
  fn record_release(
    &self,
    git: &SystemGit,
    version: &Version,
    commits: &[CommitInfo],
    request: &VersionRequest,
  ) -> ReleaseResult<()> {
    let tag = release_tag(version);

    if request.commit {
      let mut changed: Vec<PathBuf> = Vec::new();

      if update_manifest_version(&self.manifest_path(), version)? {
        println!("   Updated Cargo.toml version");
        changed.push(PathBuf::from("Cargo.toml"));
      }

      let entry = Changelog::from_commits(version.to_string(), today(), commits).to_markdown();
      prepend_changelog(&self.root.join(&self.changelog_path), &entry)?;
      println!("   Updated {}", self.changelog_path.display());
      changed.push(self.changelog_path.clone());

      let paths: Vec<&Path> = changed.iter().map(PathBuf::as_path).collect();
      git.add(&paths)?;
      let sha = git.commit(&format!("chore(release): {}", tag))?;
      println!("   Committed release {} ({})", tag, &sha[..sha.len().min(7)]);
    }

    if request.tag {
      if git.tag_exists(&tag) {
        println!("   ⚠️  Tag {} already exists, skipping", tag);
      } else {
        git.create_tag(&tag, &format!("Release {}", tag))?;
        println!("   Created tag: {}", tag);
      }
    }

    Ok(())
  }
}

impl VersionSource for GitWorkspace {
  fn compute_version(&self, request: &VersionRequest) -> ReleaseResult<Option<Version>> {
    let git = SystemGit::open(&self.root)?;
    let (last, commits) = self.history(&git, None)?;
    let next = self.next_version(request, last.as_ref().map(|(_, v)| v), &commits)?;

    if let Some(version) = &next
      && !request.dry_run
    {
      self.record_release(&git, version, &commits, request)?;
    }

    Ok(next)
  }

  fn compute_changelog(&self, version: &Version, _request: &VersionRequest) -> ReleaseResult<ChangelogOutput> {
    let git = SystemGit::open(&self.root)?;
    // The release being described may already be tagged by an earlier `version --apply`
    let (_, commits) = self.history(&git, Some(version))?;
    let changelog = Changelog::from_commits(version.to_string(), today(), &commits);
    Ok(ChangelogOutput::Text(changelog.to_markdown()))
  }
}

/// Highest stable `v<semver>` tag, optionally strictly below `before`
fn latest_release_tag(git: &SystemGit, before: Option<&Version>) -> ReleaseResult<Option<(String, Version)>> {
  let ceiling = before.map(|v| Version::new(v.major, v.minor, v.patch));
  let latest = git
    .list_tags("v*")?
    .into_iter()
    .filter_map(|tag| {
      let version = Version::parse(tag.strip_prefix('v')?).ok()?;
      (version.pre.is_empty() && version.build.is_empty()).then_some((tag, version))
    })
    .filter(|(_, version)| ceiling.as_ref().is_none_or(|c| version < c))
    .max_by(|a, b| a.1.cmp(&b.1));
  Ok(latest)
}

/// Determine version bump from commits
pub fn determine_bump(commits: &[CommitInfo]) -> VersionBump {
  if commits.is_empty() {
    return VersionBump::None;
  }

  let parsed: Vec<Option<ConventionalCommit>> = commits.iter().map(|c| ConventionalCommit::parse(&c.message)).collect();

  let breaking = commits.iter().zip(&parsed).any(|(commit, parsed)| match parsed {
    Some(parsed) => parsed.is_breaking(),
    None => has_breaking_footer(&commit.message),
  });
  if breaking {
    return VersionBump::Major;
  }

  if parsed.iter().flatten().any(|c| c.commit_type == CommitType::Feat) {
    return VersionBump::Minor;
  }

  // fix/perf and everything else (docs, chore, non-conventional) ship as a patch
  VersionBump::Patch
}

/// `BREAKING CHANGE: ...` footer line in a message the parser rejected
fn has_breaking_footer(message: &str) -> bool {
  message
    .lines()
    .skip(1)
    .map(str::trim_start)
    .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"))
}

fn today() -> String {
  chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// `[workspace.package].version` or `[package].version`
fn read_manifest_version(path: &Path) -> ReleaseResult<Option<Version>> {
  if !path.exists() {
    return Ok(None);
  }
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let doc: toml_edit::DocumentMut = content.parse()?;

  let version = doc
    .get("workspace")
    .and_then(|w| w.get("package"))
    .and_then(|p| p.get("version"))
    .or_else(|| doc.get("package").and_then(|p| p.get("version")))
    .and_then(|v| v.as_str());

  match version {
    Some(v) => Ok(Some(
      Version::parse(v).with_context(|| format!("Invalid version in {}", path.display()))?,
    )),
    None => Ok(None),
  }
}

/// Rewrite the manifest version in place; false when the manifest carries none
fn update_manifest_version(path: &Path, version: &Version) -> ReleaseResult<bool> {
  if !path.exists() {
    return Ok(false);
  }
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let mut doc: toml_edit::DocumentMut = content.parse()?;

  let target = if doc
    .get("workspace")
    .and_then(|w| w.get("package"))
    .and_then(|p| p.get("version"))
    .is_some()
  {
    doc["workspace"]["package"].as_table_like_mut()
  } else if doc.get("package").and_then(|p| p.get("version")).is_some() {
    doc["package"].as_table_like_mut()
  } else {
    None
  };

  let Some(table) = target else {
    return Ok(false);
  };
  table.insert("version", toml_edit::value(version.to_string()));

  fs::write(path, doc.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(true)
}

/// Insert a new entry below the changelog header
fn prepend_changelog(path: &Path, entry: &str) -> ReleaseResult<()> {
  let existing = if path.exists() {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
  } else {
    "# Changelog\n\nAll notable changes to this project will be documented in this file.\n\n".to_string()
  };

  let new_content = if existing.starts_with("# Changelog") {
    match existing.find("\n\n## ") {
      Some(first_entry) => {
        let (header, rest) = existing.split_at(first_entry + 2);
        format!("{}{}\n\n{}", header, entry.trim_end(), rest)
      }
      None => format!("{}\n\n{}", existing.trim_end(), entry),
    }
  } else {
    format!("{}\n\n{}", entry.trim_end(), existing)
  };

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, new_content).map_err(|e| ReleaseError::message(format!("Failed to write changelog: {}", e)))
}
