//! Error types for release-tool with contextual messages and exit codes
//!
//! Every pipeline stage returns `ReleaseResult`. The stage boundary decides
//! whether an error is fatal or degraded; whatever reaches `main` is fatal and
//! mapped to an exit code here.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// Validation failure (no version, checksum mismatch)
  Validation = 3,
  /// A container publish target failed
  Publish = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-tool
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Code-hosting API errors
  Host(HostError),

  /// Validation errors (version resolution, checksums)
  Validation(ValidationError),

  /// Container publish failures
  Publish(PublishError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Typed errors are wrapped into a message so the context is never lost.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(e) => ReleaseError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Host(_) => ExitCode::System,
      ReleaseError::Validation(_) => ExitCode::Validation,
      ReleaseError::Publish(_) => ExitCode::Publish,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Host(e) => e.help_message(),
      ReleaseError::Validation(e) => e.help_message(),
      ReleaseError::Publish(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }

  /// True when the host reported the object does not exist
  pub fn is_not_found(&self) -> bool {
    matches!(self, ReleaseError::Host(HostError::NotFound { .. }))
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Host(e) => write!(f, "{}", e),
      ReleaseError::Validation(e) => write!(f, "{}", e),
      ReleaseError::Publish(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for ReleaseError {
  fn from(err: semver::Error) -> Self {
    ReleaseError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<reqwest::Error> for ReleaseError {
  fn from(err: reqwest::Error) -> Self {
    ReleaseError::Host(HostError::Transport {
      message: err.to_string(),
    })
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file could not be parsed
  Invalid { path: PathBuf, reason: String },

  /// Required setting is missing or empty
  MissingField { field: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { path, .. } => Some(format!("Fix or remove {} to fall back to defaults.", path.display())),
      ConfigError::MissingField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in config: {}", field)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run release-tool from inside the repository checkout: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } if stderr.contains("Please tell me who you are") => {
        Some("Configure a committer identity (git config user.name / user.email) in CI.".to_string())
      }
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Code-hosting API errors
#[derive(Debug)]
pub enum HostError {
  /// The requested object does not exist (HTTP 404)
  NotFound { resource: String },

  /// The API answered with a non-success status
  Status { method: String, url: String, status: u16, body: String },

  /// Request never completed (DNS, TLS, connection reset, ...)
  Transport { message: String },
}

impl HostError {
  fn help_message(&self) -> Option<String> {
    match self {
      HostError::Status { status: 401, .. } | HostError::Status { status: 403, .. } => {
        Some("Check that GITHUB_TOKEN has `contents: write` and `pull-requests: write` permissions.".to_string())
      }
      HostError::Status { status: 422, .. } => {
        Some("The host rejected the payload; an asset with the same name may already exist.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for HostError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostError::NotFound { resource } => write!(f, "Not found: {}", resource),
      HostError::Status {
        method,
        url,
        status,
        body,
      } => write!(f, "{} {} returned HTTP {}\n{}", method, url, status, body),
      HostError::Transport { message } => write!(f, "HTTP request failed: {}", message),
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// No version could be determined on the release path
  NoVersion { reason: String },

  /// A packaged artifact does not match checksums.txt
  ChecksumMismatch { file: String, expected: String, actual: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::NoVersion { .. } => Some(
        "Push a conventional commit since the last `v*` tag, or pass --specifier to force a version.".to_string(),
      ),
      ValidationError::ChecksumMismatch { .. } => {
        Some("Re-run the packaging step; the artifacts directory is out of date.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::NoVersion { reason } => {
        write!(f, "Could not determine a release version: {}", reason)
      }
      ValidationError::ChecksumMismatch { file, expected, actual } => {
        write!(f, "Checksum mismatch for {}: expected {}, got {}", file, expected, actual)
      }
    }
  }
}

/// Container publish failures
#[derive(Debug)]
pub enum PublishError {
  /// The publish command for a target exited nonzero
  TargetFailed { target: String, status: Option<i32> },

  /// The publish command could not be spawned
  Spawn { target: String, reason: String },
}

impl PublishError {
  fn help_message(&self) -> Option<String> {
    match self {
      PublishError::TargetFailed { .. } => {
        Some("Targets after the failed one were not attempted; re-run once the image builds.".to_string())
      }
      PublishError::Spawn { .. } => Some("Check `[containers].command` in release.toml.".to_string()),
    }
  }
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishError::TargetFailed { target, status } => match status {
        Some(code) => write!(f, "Publishing '{}' failed with exit code {}", target, code),
        None => write!(f, "Publishing '{}' was terminated by a signal", target),
      },
      PublishError::Spawn { target, reason } => {
        write!(f, "Could not start publish command for '{}': {}", target, reason)
      }
    }
  }
}

/// Result type alias for release-tool
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
