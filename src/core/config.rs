use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for release-tool
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every section is optional; a repository without a config file runs on defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  #[serde(default)]
  pub artifacts: ArtifactsConfig,
  #[serde(default)]
  pub version: VersionConfig,
  #[serde(default)]
  pub comment: CommentConfig,
  #[serde(default)]
  pub containers: ContainersConfig,
}

/// Where the version artifact and packaged outputs live
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsConfig {
  /// Artifact directory (relative to repository root)
  #[serde(default = "default_artifact_dir")]
  pub dir: PathBuf,

  /// Subdirectory of `dir` holding packaged release assets
  #[serde(default = "default_release_dir")]
  pub release_dir: PathBuf,
}

fn default_artifact_dir() -> PathBuf {
  PathBuf::from(".artifacts")
}

fn default_release_dir() -> PathBuf {
  PathBuf::from("pack")
}

impl Default for ArtifactsConfig {
  fn default() -> Self {
    Self {
      dir: default_artifact_dir(),
      release_dir: default_release_dir(),
    }
  }
}

impl ArtifactsConfig {
  /// Path of the resolved version file
  pub fn version_file(&self, root: &Path) -> PathBuf {
    root.join(&self.dir).join("version")
  }

  /// Directory scanned for release assets
  pub fn release_assets_dir(&self, root: &Path) -> PathBuf {
    root.join(&self.dir).join(&self.release_dir)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
  /// Primary integration branch
  #[serde(default = "default_main_branch")]
  pub main_branch: String,

  /// Name exported to the CI env file
  #[serde(default = "default_env_name")]
  pub env_name: String,

  /// Version used for the first release when neither a tag nor a manifest version exists
  #[serde(default = "default_initial_version")]
  pub initial_version: String,

  /// Changelog file updated when the version step commits
  #[serde(default = "default_changelog_path")]
  pub changelog: PathBuf,
}

fn default_main_branch() -> String {
  "main".to_string()
}

fn default_env_name() -> String {
  "RELEASE_VERSION".to_string()
}

fn default_initial_version() -> String {
  "0.1.0".to_string()
}

fn default_changelog_path() -> PathBuf {
  PathBuf::from("CHANGELOG.md")
}

impl Default for VersionConfig {
  fn default() -> Self {
    Self {
      main_branch: default_main_branch(),
      env_name: default_env_name(),
      initial_version: default_initial_version(),
      changelog: default_changelog_path(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentConfig {
  /// Heading that identifies the tracking comment on a pull request
  #[serde(default = "default_marker")]
  pub marker: String,
}

fn default_marker() -> String {
  "## 🚀 Release Preview".to_string()
}

impl Default for CommentConfig {
  fn default() -> Self {
    Self {
      marker: default_marker(),
    }
  }
}

/// Container images published after the release
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainersConfig {
  /// Publish targets, invoked in order
  #[serde(default = "default_targets")]
  pub targets: Vec<String>,

  /// Command run per target; `{target}` and `{version}` are substituted
  #[serde(default = "default_command")]
  pub command: Vec<String>,
}

fn default_targets() -> Vec<String> {
  vec!["api".to_string(), "login".to_string()]
}

fn default_command() -> Vec<String> {
  ["docker", "buildx", "bake", "--push", "{target}"]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ContainersConfig {
  fn default() -> Self {
    Self {
      targets: default_targets(),
      command: default_command(),
    }
  }
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content).map_err(|e| {
      ReleaseError::Config(ConfigError::Invalid {
        path: config_path.clone(),
        reason: e.to_string(),
      })
    })?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Validate settings that serde cannot check on its own
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.version.main_branch.trim().is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "version.main_branch".to_string(),
      }));
    }

    if self.version.env_name.is_empty() || self.version.env_name.contains('=') {
      return Err(ReleaseError::message(format!(
        "Invalid version.env_name '{}'. Must be non-empty and must not contain '='",
        self.version.env_name
      )));
    }

    if semver::Version::parse(&self.version.initial_version).is_err() {
      return Err(ReleaseError::message(format!(
        "Invalid version.initial_version '{}'. Must be valid semver (e.g., '0.1.0')",
        self.version.initial_version
      )));
    }

    if self.comment.marker.trim().is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "comment.marker".to_string(),
      }));
    }

    if self.containers.command.is_empty() {
      return Err(ReleaseError::with_help(
        "containers.command must not be empty",
        "Use e.g. command = [\"docker\", \"buildx\", \"bake\", \"--push\", \"{target}\"]",
      ));
    }

    Ok(())
  }
}
