//! Version resolution
//!
//! Decides between a preview version (`<version>+<branch>`, never tagged) and
//! a release version, then persists it so later stages and later CI steps read
//! the same value.

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, ValidationError};
use semver::{BuildMetadata, Version};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Version bump type based on conventional commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
  /// Major version bump (breaking changes)
  Major,
  /// Minor version bump (new features)
  Minor,
  /// Patch version bump (bug fixes)
  Patch,
  /// No bump needed (no relevant changes)
  None,
}

impl VersionBump {
  /// Apply bump to a semver version
  pub fn apply(&self, version: &Version) -> Version {
    match self {
      VersionBump::Major => Version::new(version.major + 1, 0, 0),
      VersionBump::Minor => Version::new(version.major, version.minor + 1, 0),
      VersionBump::Patch => Version::new(version.major, version.minor, version.patch + 1),
      VersionBump::None => version.clone(),
    }
  }
}

/// Caller override for the computed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
  /// Force a bump kind regardless of commit history
  Bump(VersionBump),
  /// Use this exact version
  Exact(Version),
}

impl FromStr for Specifier {
  type Err = ReleaseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "major" => Ok(Specifier::Bump(VersionBump::Major)),
      "minor" => Ok(Specifier::Bump(VersionBump::Minor)),
      "patch" => Ok(Specifier::Bump(VersionBump::Patch)),
      other => {
        let version = Version::parse(other.strip_prefix('v').unwrap_or(other)).map_err(|_| {
          ReleaseError::with_help(
            format!("Invalid specifier '{}'", other),
            "Use major, minor, patch or an explicit version such as 1.4.0",
          )
        })?;
        Ok(Specifier::Exact(version))
      }
    }
  }
}

/// Flags passed to the workspace versioning interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRequest {
  pub dry_run: bool,
  pub commit: bool,
  pub tag: bool,
  pub first_release: bool,
  pub specifier: Option<Specifier>,
}

impl VersionRequest {
  /// Read-only request: nothing is written, committed or tagged
  pub fn dry_run() -> Self {
    Self {
      dry_run: true,
      ..Self::default()
    }
  }

  /// Preview builds tolerate a missing previous release
  pub fn preview(specifier: Option<Specifier>) -> Self {
    Self {
      dry_run: true,
      commit: false,
      tag: false,
      first_release: true,
      specifier,
    }
  }

  /// Release builds commit and tag unless `dry_run`
  pub fn release(dry_run: bool, specifier: Option<Specifier>) -> Self {
    Self {
      dry_run,
      commit: !dry_run,
      tag: !dry_run,
      first_release: false,
      specifier,
    }
  }
}

/// Changelog as returned by the versioning interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogOutput {
  Text(String),
  /// One entry per project, keyed by project name
  #[allow(dead_code)] // GitWorkspace versions the repository as a single project
  PerProject(BTreeMap<String, String>),
}

/// Workspace release-versioning interface
pub trait VersionSource {
  /// Compute the next version; `None` when no version can be determined
  fn compute_version(&self, request: &VersionRequest) -> ReleaseResult<Option<Version>>;

  /// Changelog describing the changes that make up `version`
  fn compute_changelog(&self, version: &Version, request: &VersionRequest) -> ReleaseResult<ChangelogOutput>;
}

/// Make a branch name safe for build metadata and file names.
///
/// Every character outside `[A-Za-z0-9-]` becomes `-`.
pub fn sanitize_branch(branch: &str) -> String {
  branch
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
    .collect()
}

/// Attach the sanitized branch as build metadata
pub fn preview_version(base: &Version, branch: &str) -> ReleaseResult<Version> {
  let mut suffix = sanitize_branch(branch);
  if suffix.is_empty() {
    suffix = "unknown".to_string();
  }
  let mut version = base.clone();
  version.build = BuildMetadata::new(&suffix)?;
  Ok(version)
}

/// Resolve the version for this run and persist it.
///
/// `dry_run` only matters on the release path; previews are never committed.
pub fn resolve_version(
  ctx: &ReleaseContext,
  source: &dyn VersionSource,
  dry_run: bool,
  specifier: Option<Specifier>,
) -> ReleaseResult<Version> {
  let version = if ctx.is_preview() {
    let base = source
      .compute_version(&VersionRequest::preview(specifier))?
      .ok_or_else(|| {
        ReleaseError::Validation(ValidationError::NoVersion {
          reason: "the workspace reported no version for the preview build".to_string(),
        })
      })?;
    let version = preview_version(&base, ctx.branch.as_deref().unwrap_or_default())?;
    println!("🔍 Preview Version: {}", version);
    version
  } else {
    let request = VersionRequest::release(dry_run, specifier);
    let version = source.compute_version(&request)?.ok_or_else(|| {
      ReleaseError::Validation(ValidationError::NoVersion {
        reason: "no releasable changes since the last release tag".to_string(),
      })
    })?;
    println!("📦 Release Version: {}", version);
    if dry_run {
      println!("   Dry-run: no commit or tag created");
    }
    version
  };

  VersionArtifact::new(ctx).write(&version)?;
  if let Some(env_file) = &ctx.env_file {
    export_version(env_file, &ctx.config.version.env_name, &version)?;
    println!("   Exported {} to {}", ctx.config.version.env_name, env_file.display());
  }

  Ok(version)
}

/// Reuse the version persisted by an earlier step, resolving (dry-run) only when absent
///
/// A persisted version takes precedence over `specifier`; the override is
/// reported and dropped.
pub fn load_or_resolve(
  ctx: &ReleaseContext,
  source: &dyn VersionSource,
  specifier: Option<Specifier>,
) -> ReleaseResult<Version> {
  let artifact = VersionArtifact::new(ctx);
  if let Some(version) = artifact.read()? {
    println!("📄 Using version from {}: {}", artifact.path().display(), version);
    if let Some(specifier) = specifier {
      println!(
        "   ⚠️  Ignoring --specifier: {} already holds the version for this build",
        artifact.path().display()
      );
      tracing::warn!(?specifier, version = %version, "specifier ignored in favour of the version artifact");
    }
    return Ok(version);
  }
  resolve_version(ctx, source, true, specifier)
}

/// The on-disk `version` file
pub struct VersionArtifact {
  path: PathBuf,
}

impl VersionArtifact {
  pub fn new(ctx: &ReleaseContext) -> Self {
    Self {
      path: ctx.config.artifacts.version_file(ctx.root()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Write the version, creating the artifact directory if needed
  pub fn write(&self, version: &Version) -> ReleaseResult<()> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&self.path, format!("{}\n", version))
      .with_context(|| format!("Failed to write {}", self.path.display()))?;
    tracing::debug!(path = %self.path.display(), %version, "version artifact written");
    Ok(())
  }

  /// Read a previously written version; None when the file does not exist
  pub fn read(&self) -> ReleaseResult<Option<Version>> {
    if !self.path.exists() {
      return Ok(None);
    }
    let content =
      fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
    let version = Version::parse(content.trim())
      .with_context(|| format!("{} does not contain a valid version", self.path.display()))?;
    Ok(Some(version))
  }
}

/// Append `NAME=value` to the CI env file
fn export_version(env_file: &Path, name: &str, version: &Version) -> ReleaseResult<()> {
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(env_file)
    .with_context(|| format!("Failed to open {}", env_file.display()))?;
  writeln!(file, "{}={}", name, version).with_context(|| format!("Failed to append to {}", env_file.display()))?;
  Ok(())
}
