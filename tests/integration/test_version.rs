//! Integration tests for `release-tool version`

use crate::helpers::{TestWorkspace, run_release_tool, run_release_tool_ok, stderr, stdout};
use anyhow::Result;

const MAIN: &[(&str, &str)] = &[("GITHUB_REF", "refs/heads/main"), ("GITHUB_REF_NAME", "main")];

#[test]
fn test_preview_version_on_pull_request() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_release_tool_ok(
    &ws.path,
    &["version"],
    &[
      ("GITHUB_EVENT_NAME", "pull_request"),
      ("GITHUB_HEAD_REF", "feature/foo!bar"),
      ("GITHUB_REF", "refs/pull/3/merge"),
    ],
  )?;

  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "0.1.0+feature-foo-bar");
  assert!(stdout(&output).contains("Preview Version:"));
  assert!(ws.tags()?.is_empty(), "previews are never tagged");
  assert_eq!(ws.head_subject()?, "chore: initial commit");

  Ok(())
}

#[test]
fn test_preview_on_non_main_branch_exports_env() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;
  ws.commit_change("fix: handle empty input")?;
  let env_file = ws.path.join("github_env");

  run_release_tool_ok(
    &ws.path,
    &["version"],
    &[
      ("GITHUB_REF", "refs/heads/release/next"),
      ("GITHUB_REF_NAME", "release/next"),
      ("GITHUB_ENV", env_file.to_str().unwrap()),
    ],
  )?;

  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "0.1.1+release-next");
  assert!(ws.read_file("github_env")?.contains("RELEASE_VERSION=0.1.1+release-next\n"));

  Ok(())
}

#[test]
fn test_main_branch_dry_run_bumps_from_tag() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;
  ws.commit_change("feat: add widget")?;

  let output = run_release_tool_ok(&ws.path, &["version"], MAIN)?;

  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "0.2.0");
  assert!(stdout(&output).contains("Release Version: 0.2.0"));
  assert_eq!(ws.tags()?, vec!["v0.1.0"]);

  Ok(())
}

#[test]
fn test_apply_commits_and_tags() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;
  ws.commit_change("feat: add widget")?;
  ws.commit_change("fix: widget alignment")?;

  run_release_tool_ok(&ws.path, &["version", "--apply"], MAIN)?;

  assert!(ws.tags()?.contains(&"v0.2.0".to_string()));
  assert_eq!(ws.head_subject()?, "chore(release): v0.2.0");
  assert!(ws.read_file("Cargo.toml")?.contains("version = \"0.2.0\""));

  let changelog = ws.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("## [0.2.0]"));
  assert!(changelog.contains("add widget"));
  assert!(changelog.contains("widget alignment"));

  Ok(())
}

#[test]
fn test_breaking_change_bumps_major() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v1.4.2")?;
  ws.commit_change("feat(api)!: drop v1 endpoints")?;

  run_release_tool_ok(&ws.path, &["version"], MAIN)?;

  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "2.0.0");
  Ok(())
}

#[test]
fn test_specifier_overrides_history() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;

  run_release_tool_ok(&ws.path, &["version", "--specifier", "v3.0.0"], MAIN)?;

  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "3.0.0");
  Ok(())
}

#[test]
fn test_no_releasable_changes_is_fatal() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;

  let output = run_release_tool(&ws.path, &["version"], MAIN)?;

  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("Could not determine a release version"));
  assert!(!ws.file_exists(".artifacts/version"));

  Ok(())
}

#[test]
fn test_invalid_config_is_user_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("release.toml", "[artifacts]\nunknown_key = true\n")?;

  let output = run_release_tool(&ws.path, &["version"], MAIN)?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("release.toml"));

  Ok(())
}

#[test]
fn test_custom_artifact_dir() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("release.toml", "[artifacts]\ndir = \"out\"\n")?;

  run_release_tool_ok(&ws.path, &["version"], &[("GITHUB_REF_NAME", "topic")])?;

  assert_eq!(ws.read_file("out/version")?.trim(), "0.1.0+topic");
  Ok(())
}
