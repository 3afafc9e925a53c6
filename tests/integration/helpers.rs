//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test repository with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a repository on `main` with a versioned manifest and one commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("Cargo.toml"),
      r#"[package]
name = "widget"
version = "0.1.0"
edition = "2024"
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "chore: initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Write a file (parents created) without committing
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }

  /// Commit a change to `src/lib.rs` with the given message
  pub fn commit_change(&self, message: &str) -> Result<String> {
    let lib = self.path.join("src/lib.rs");
    let mut content = std::fs::read_to_string(&lib).unwrap_or_default();
    content.push_str(&format!("// {}\n", message));
    self.write_file("src/lib.rs", &content)?;

    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create an annotated tag at HEAD
  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", "-a", name, "-m", name])?;
    Ok(())
  }

  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Subject of the HEAD commit
  pub fn head_subject(&self) -> Result<String> {
    let output = git(&self.path, &["log", "-1", "--format=%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run release-tool with a controlled environment.
///
/// Only PATH and HOME are inherited so CI variables of the host never leak in.
pub fn run_release_tool(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-tool");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args).env_clear();
  for key in ["PATH", "HOME"] {
    if let Ok(value) = std::env::var(key) {
      cmd.env(key, value);
    }
  }
  cmd.envs(envs.iter().copied());

  cmd.output().context("Failed to run release-tool")
}

/// Run release-tool and fail the test unless it exits successfully
pub fn run_release_tool_ok(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  let output = run_release_tool(cwd, args, envs)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "release-tool command failed: release-tool {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
