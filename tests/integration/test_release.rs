//! Integration tests for `release-tool release`

use crate::helpers::{TestWorkspace, run_release_tool, run_release_tool_ok, stderr, stdout};
use anyhow::Result;

const LIVE_MAIN: &[(&str, &str)] = &[("GITHUB_REF", "refs/heads/main"), ("RELEASE_LIVE", "true")];

#[test]
fn test_plan_release_without_token() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_release_tool_ok(
    &ws.path,
    &["release"],
    &[("GITHUB_EVENT_NAME", "pull_request"), ("GITHUB_HEAD_REF", "feature/x")],
  )?;
  let out = stdout(&output);

  assert!(out.contains("plan (dry-run)"));
  assert!(out.contains("skipping comment and release stages"));
  assert!(out.contains("Would publish container target 'api'"));
  assert!(out.contains("Would publish container target 'login'"));
  assert_eq!(ws.read_file(".artifacts/version")?.trim(), "0.1.0+feature-x");

  Ok(())
}

#[test]
fn test_release_reuses_version_from_earlier_step() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(".artifacts/version", "4.5.6\n")?;

  let output = run_release_tool_ok(&ws.path, &["release"], &[("GITHUB_REF_NAME", "topic")])?;
  let out = stdout(&output);

  assert!(out.contains("Using version from"));
  assert!(out.contains("at 4.5.6"));

  Ok(())
}

#[test]
fn test_specifier_is_reported_when_version_artifact_exists() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(".artifacts/version", "4.5.6\n")?;

  let output = run_release_tool_ok(
    &ws.path,
    &["release", "--specifier", "major"],
    &[("GITHUB_REF_NAME", "topic")],
  )?;
  let out = stdout(&output);

  assert!(out.contains("Ignoring --specifier"));
  assert!(out.contains("Release pipeline finished for 4.5.6"));

  Ok(())
}

#[test]
fn test_rerelease_uses_tag_created_by_version_step() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.tag("v0.1.0")?;
  ws.commit_change("feat: add widget")?;

  run_release_tool_ok(&ws.path, &["version", "--apply"], &[("GITHUB_REF", "refs/heads/main")])?;
  let output = run_release_tool_ok(&ws.path, &["release"], &[("GITHUB_REF", "refs/heads/main")])?;

  assert!(stdout(&output).contains("Release pipeline finished for 0.2.0"));
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_live_targets_run_in_order() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(".artifacts/version", "1.2.3\n")?;
  ws.write_file(
    "release.toml",
    r#"[containers]
targets = ["api", "login"]
command = ["sh", "-c", "echo {target}-$RELEASE_VERSION >> published.txt"]
"#,
  )?;

  run_release_tool_ok(&ws.path, &["release"], LIVE_MAIN)?;

  assert_eq!(ws.read_file("published.txt")?, "api-1.2.3\nlogin-1.2.3\n");
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_live_container_failure_stops_run() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(".artifacts/version", "1.2.3\n")?;
  ws.write_file(
    "release.toml",
    r#"[containers]
targets = ["api", "login"]
command = ["sh", "-c", "echo {target} >> attempted.txt; exit 7"]
"#,
  )?;

  let output = run_release_tool(&ws.path, &["release"], LIVE_MAIN)?;

  assert_eq!(output.status.code(), Some(4));
  assert!(stderr(&output).contains("Publishing 'api' failed with exit code 7"));
  assert_eq!(ws.read_file("attempted.txt")?, "api\n");

  Ok(())
}
