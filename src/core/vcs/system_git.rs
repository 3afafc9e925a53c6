//! System git backend - zero dependencies
//!
//! Uses porcelain/plumbing commands through a sanitized subprocess. Only the
//! operations the release pipeline needs: branch/HEAD lookup, tag listing,
//! commit walking, staging, committing and tagging.

use super::CommitInfo;
use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to confirm `path` is inside a work tree.
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ReleaseResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Get current branch name ("HEAD" when detached)
  pub fn current_branch(&self) -> ReleaseResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "--abbrev-ref", "HEAD"])
      .output()
      .context("Failed to get current branch")?;

    if !output.status.success() {
      return Ok("HEAD".to_string()); // Detached HEAD or unborn branch
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// List tag names matching a glob pattern
  pub fn list_tags(&self, pattern: &str) -> ReleaseResult<Vec<String>> {
    let output = self.run(&["tag", "--list", pattern])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }

  /// Commits reachable from HEAD, newest first, optionally stopping at `since`
  pub fn commits_since(&self, since: Option<&str>) -> ReleaseResult<Vec<CommitInfo>> {
    let range = match since {
      Some(rev) => format!("{}..HEAD", rev),
      None => "HEAD".to_string(),
    };
    let format = format!("--format=%H{}%B{}", FIELD_SEP, RECORD_SEP);
    let output = self.run(&["log", "--no-merges", &format, &range])?;

    Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
  }

  /// Stage paths for the next commit
  pub fn add(&self, paths: &[&Path]) -> ReleaseResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("add").arg("--");
    for path in paths {
      cmd.arg(path);
    }
    let output = cmd.output().context("Failed to run git add")?;
    check_status("git add", output).map(|_| ())
  }

  /// Commit staged changes
  pub fn commit(&self, message: &str) -> ReleaseResult<String> {
    self.run(&["commit", "-m", message])?;
    self.head_commit()
  }

  /// Create an annotated tag at HEAD
  pub fn create_tag(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", tag, "-m", message]).map(|_| ())
  }

  /// Check whether a tag already exists
  pub fn tag_exists(&self, tag: &str) -> bool {
    self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &format!("refs/tags/{}", tag)])
      .output()
      .map(|o| o.status.success())
      .unwrap_or(false)
  }

  fn run(&self, args: &[&str]) -> ReleaseResult<Output> {
    tracing::debug!(args = ?args, "git");
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to run git {}", args.join(" ")))?;
    check_status(&format!("git {}", args.join(" ")), output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists PATH, HOME and the committer identity variables
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    for key in [
      "PATH",
      "HOME",
      "GIT_AUTHOR_NAME",
      "GIT_AUTHOR_EMAIL",
      "GIT_COMMITTER_NAME",
      "GIT_COMMITTER_EMAIL",
    ] {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("tag.gpgSign=false");
    cmd.arg("-c").arg("commit.gpgSign=false");

    cmd
  }
}

fn check_status(command: &str, output: Output) -> ReleaseResult<Output> {
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(ReleaseError::Git(GitError::CommandFailed {
      command: command.to_string(),
      stderr: stderr.trim().to_string(),
    }));
  }
  Ok(output)
}

/// Parse `%H<US>%B<RS>` records
fn parse_log(stdout: &str) -> Vec<CommitInfo> {
  stdout
    .split(RECORD_SEP)
    .filter_map(|record| {
      let record = record.trim_start_matches('\n');
      let (sha, message) = record.split_once(FIELD_SEP)?;
      let sha = sha.trim();
      if sha.is_empty() {
        return None;
      }
      Some(CommitInfo {
        sha: sha.to_string(),
        message: message.trim().to_string(),
      })
    })
    .collect()
}
