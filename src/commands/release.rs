//! `release-tool release`
//!
//! Runs the stages in order. The version step is a hard dependency; the
//! changelog and preview comment are advisory; publishing and container
//! targets fail the run on the first error.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::github::{CodeHost, GitHubClient};
use crate::release::GitWorkspace;
use crate::release::changelog::generate_preview_changelog;
use crate::release::comment::publish_preview_comment;
use crate::release::container::{CommandRunner, PublishRunner, publish_containers};
use crate::release::publisher::PublishRelease;
use crate::release::version::{Specifier, VersionSource, load_or_resolve};
use crate::release::workspace::release_tag;

/// Run the full release pipeline
pub fn run_release(ctx: &ReleaseContext, specifier: Option<Specifier>) -> ReleaseResult<()> {
  println!("🚦 Release mode: {}", ctx.mode);

  let client = match &ctx.host {
    Some(settings) => Some(GitHubClient::new(settings)?),
    None => {
      println!("   No GITHUB_TOKEN/GITHUB_REPOSITORY, skipping comment and release stages");
      None
    }
  };
  let host = client.as_ref().map(|c| c as &dyn CodeHost);

  let workspace = GitWorkspace::new(ctx);
  let runner = CommandRunner::new(&ctx.config.containers, &ctx.config.version.env_name);
  run_pipeline(ctx, &workspace, host, &runner, specifier)
}

/// Pipeline over injectable collaborators
pub fn run_pipeline(
  ctx: &ReleaseContext,
  source: &dyn VersionSource,
  host: Option<&dyn CodeHost>,
  runner: &dyn PublishRunner,
  specifier: Option<Specifier>,
) -> ReleaseResult<()> {
  let version = load_or_resolve(ctx, source, specifier)?;
  let changelog = generate_preview_changelog(source, &version);

  if !ctx.mode.is_live() {
    match host {
      Some(host) => publish_preview_comment(ctx, host, &version, &changelog),
      None => tracing::info!("no code host configured, preview comment skipped"),
    }
  }

  match host {
    Some(host) => {
      let assets_dir = ctx.config.artifacts.release_assets_dir(ctx.root());
      ctx.mode.run(&PublishRelease::new(host, release_tag(&version), assets_dir))?;
    }
    None => tracing::info!("no code host configured, release publishing skipped"),
  }

  publish_containers(ctx.mode, &ctx.config.containers.targets, &version, runner)?;

  println!("✅ Release pipeline finished for {}", version);
  Ok(())
}
