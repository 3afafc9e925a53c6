//! Unified run context - resolve once, pass everywhere
//!
//! Every environment signal the pipeline branches on (mode, branch, event
//! type, credentials) is read exactly once in `main.rs` and frozen into a
//! `ReleaseContext`. Stages receive `&ReleaseContext` and never consult the
//! process environment themselves.

use crate::core::config::ReleaseConfig;
use crate::core::vcs::SystemGit;
use crate::release::mode::ReleaseMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// `owner/repo` pair identifying the hosted repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
  pub owner: String,
  pub name: String,
}

impl RepoSlug {
  /// Parse `owner/repo`
  pub fn parse(slug: &str) -> Option<Self> {
    let (owner, name) = slug.trim().split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
      return None;
    }
    Some(Self {
      owner: owner.to_string(),
      name: name.to_string(),
    })
  }
}

impl std::fmt::Display for RepoSlug {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

/// Credentials and coordinates for the code-hosting API
#[derive(Clone)]
pub struct HostSettings {
  pub token: String,
  pub repository: RepoSlug,
  pub api_url: String,
}

impl std::fmt::Debug for HostSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HostSettings")
      .field("token", &"[REDACTED]")
      .field("repository", &self.repository)
      .field("api_url", &self.api_url)
      .finish()
  }
}

/// Immutable per-run context.
///
/// Built once at startup, passed by reference to all commands and stages.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Repository root (absolute path)
  pub root: PathBuf,

  /// Loaded release.toml (or defaults)
  pub config: Arc<ReleaseConfig>,

  /// Live or plan, fixed for the whole run
  pub mode: ReleaseMode,

  /// Current ref is the primary integration branch
  pub is_main: bool,

  /// Triggered by a pull-request event
  pub is_pull_request: bool,

  /// Raw (unsanitized) branch name, PR head branch preferred
  pub branch: Option<String>,

  /// PR number taken from the triggering event, if any
  pub pull_request_number: Option<u64>,

  /// CI-provided appendable env file
  pub env_file: Option<PathBuf>,

  /// API access; None disables commenting and publishing
  pub host: Option<HostSettings>,
}

#[derive(Deserialize)]
struct EventPayload {
  #[serde(default)]
  number: Option<u64>,
  #[serde(default)]
  pull_request: Option<PullRequestPayload>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
  number: u64,
}

impl ReleaseContext {
  /// Build context from the process environment.
  ///
  /// When no CI variable names the branch, the checked-out git branch is used.
  pub fn from_env(root: &Path, config: ReleaseConfig) -> Self {
    let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    let git_branch = || {
      SystemGit::open(root)
        .and_then(|git| git.current_branch())
        .ok()
        .filter(|b| b != "HEAD")
    };
    Self::from_lookup(root, config, lookup, git_branch)
  }

  /// Build context from an arbitrary variable lookup
  pub fn from_lookup<L, G>(root: &Path, config: ReleaseConfig, lookup: L, git_branch: G) -> Self
  where
    L: Fn(&str) -> Option<String>,
    G: FnOnce() -> Option<String>,
  {
    let mode = ReleaseMode::from_flag(lookup("RELEASE_LIVE").as_deref());

    let is_pull_request = matches!(
      lookup("GITHUB_EVENT_NAME").as_deref(),
      Some("pull_request") | Some("pull_request_target")
    );

    let git_ref = lookup("GITHUB_REF");
    let ref_name = lookup("GITHUB_REF_NAME")
      .or_else(|| {
        git_ref
          .as_deref()
          .and_then(|r| r.strip_prefix("refs/heads/"))
          .map(str::to_string)
      })
      .or_else(git_branch);

    let main = &config.version.main_branch;
    let is_main = match git_ref.as_deref() {
      Some(r) => r.strip_prefix("refs/heads/") == Some(main.as_str()),
      None => ref_name.as_deref() == Some(main.as_str()),
    };

    let branch = lookup("GITHUB_HEAD_REF").or(ref_name);

    let pull_request_number = if is_pull_request {
      lookup("GITHUB_EVENT_PATH")
        .and_then(|path| read_event_pr_number(Path::new(&path)))
        .or_else(|| git_ref.as_deref().and_then(pr_number_from_ref))
    } else {
      None
    };

    let host = match (lookup("GITHUB_TOKEN"), lookup("GITHUB_REPOSITORY")) {
      (Some(token), Some(slug)) => match RepoSlug::parse(&slug) {
        Some(repository) => Some(HostSettings {
          token,
          repository,
          api_url: lookup("GITHUB_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string(),
        }),
        None => {
          tracing::warn!(slug = %slug, "GITHUB_REPOSITORY is not an owner/repo slug; API stages disabled");
          None
        }
      },
      (Some(_), None) => {
        tracing::warn!("GITHUB_TOKEN set without GITHUB_REPOSITORY; API stages disabled");
        None
      }
      _ => None,
    };

    Self {
      root: root.to_path_buf(),
      config: Arc::new(config),
      mode,
      is_main,
      is_pull_request,
      branch,
      pull_request_number,
      env_file: lookup("GITHUB_ENV").map(PathBuf::from),
      host,
    }
  }

  /// Preview builds: any PR, or any ref other than the main branch
  pub fn is_preview(&self) -> bool {
    self.is_pull_request || !self.is_main
  }

  /// Get repository root as Path reference (convenience)
  pub fn root(&self) -> &Path {
    &self.root
  }
}

fn read_event_pr_number(path: &Path) -> Option<u64> {
  let content = std::fs::read_to_string(path).ok()?;
  let payload: EventPayload = match serde_json::from_str(&content) {
    Ok(payload) => payload,
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "could not parse event payload");
      return None;
    }
  };
  payload.pull_request.map(|pr| pr.number).or(payload.number)
}

/// `refs/pull/<n>/merge` → n
fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
  git_ref.strip_prefix("refs/pull/")?.split('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn build(vars: &[(&str, &str)], git_branch: Option<&str>) -> ReleaseContext {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ReleaseContext::from_lookup(
      Path::new("/repo"),
      ReleaseConfig::default(),
      |k| vars.get(k).cloned(),
      || git_branch.map(str::to_string),
    )
  }

  #[test]
  fn test_pull_request_context() {
    let ctx = build(
      &[
        ("GITHUB_EVENT_NAME", "pull_request"),
        ("GITHUB_HEAD_REF", "feature/foo!bar"),
        ("GITHUB_REF", "refs/pull/42/merge"),
      ],
      None,
    );

    assert!(ctx.is_pull_request);
    assert!(!ctx.is_main);
    assert!(ctx.is_preview());
    assert_eq!(ctx.branch.as_deref(), Some("feature/foo!bar"));
    assert_eq!(ctx.pull_request_number, Some(42));
    assert_eq!(ctx.mode, ReleaseMode::Plan);
  }

  #[test]
  fn test_main_push_context() {
    let ctx = build(
      &[
        ("GITHUB_EVENT_NAME", "push"),
        ("GITHUB_REF", "refs/heads/main"),
        ("GITHUB_REF_NAME", "main"),
        ("RELEASE_LIVE", "true"),
      ],
      None,
    );

    assert!(ctx.is_main);
    assert!(!ctx.is_preview());
    assert_eq!(ctx.mode, ReleaseMode::Live);
    assert_eq!(ctx.pull_request_number, None);
  }

  #[test]
  fn test_live_requires_literal_true() {
    let ctx = build(&[("RELEASE_LIVE", "1")], Some("main"));
    assert_eq!(ctx.mode, ReleaseMode::Plan);
  }

  #[test]
  fn test_git_branch_fallback() {
    let ctx = build(&[], Some("main"));
    assert!(ctx.is_main);
    assert_eq!(ctx.branch.as_deref(), Some("main"));

    let ctx = build(&[], Some("topic"));
    assert!(!ctx.is_main);
    assert_eq!(ctx.branch.as_deref(), Some("topic"));
  }

  #[test]
  fn test_host_requires_token_and_slug() {
    let ctx = build(&[("GITHUB_TOKEN", "t")], None);
    assert!(ctx.host.is_none());

    let ctx = build(&[("GITHUB_TOKEN", "t"), ("GITHUB_REPOSITORY", "acme/widget")], None);
    let host = ctx.host.unwrap();
    assert_eq!(host.repository.to_string(), "acme/widget");
    assert_eq!(host.api_url, "https://api.github.com");
    assert!(!format!("{:?}", host).contains("\"t\""));
  }

  #[test]
  fn test_event_payload_number() {
    let dir = tempfile::TempDir::new().unwrap();
    let event = dir.path().join("event.json");
    std::fs::write(&event, r#"{"action":"synchronize","pull_request":{"number":7}}"#).unwrap();
    let event = event.to_string_lossy().to_string();

    let ctx = build(
      &[("GITHUB_EVENT_NAME", "pull_request"), ("GITHUB_EVENT_PATH", event.as_str())],
      None,
    );
    assert_eq!(ctx.pull_request_number, Some(7));
  }

  #[test]
  fn test_repo_slug_parse() {
    assert_eq!(
      RepoSlug::parse("acme/widget"),
      Some(RepoSlug {
        owner: "acme".into(),
        name: "widget".into()
      })
    );
    assert!(RepoSlug::parse("acme").is_none());
    assert!(RepoSlug::parse("a/b/c").is_none());
    assert!(RepoSlug::parse("/b").is_none());
  }
}
