//! Preview comment on the originating pull request
//!
//! One tracking comment per PR, found by its marker heading and edited in
//! place on every rerun. This stage is advisory: API failures are logged and
//! never fail the run.

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::github::CodeHost;
use crate::release::artifacts::{asset_name, collect_release_assets};
use crate::release::mode::ReleaseMode;
use semver::Version;

/// What happened to the tracking comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
  Created,
  Updated(u64),
}

/// Markdown body of the tracking comment
pub fn render_comment_body(
  marker: &str,
  version: &Version,
  mode: ReleaseMode,
  artifacts: &[String],
  changelog: &str,
) -> String {
  let mut body = String::new();
  body.push_str(marker);
  body.push_str("\n\n");
  body.push_str(&format!("**Version:** `{}`\n", version));
  body.push_str(&format!("**Mode:** {}\n\n", mode.label()));

  body.push_str("### Artifacts\n");
  if artifacts.is_empty() {
    body.push_str("_No artifacts found._\n");
  } else {
    for name in artifacts {
      body.push_str(&format!("- {}\n", name));
    }
  }

  body.push_str("\n### Changelog\n");
  body.push_str(changelog.trim_end());
  body.push('\n');
  body
}

/// PR number from the triggering event, else the first open PR for the branch
pub fn resolve_pr_number(ctx: &ReleaseContext, host: &dyn CodeHost) -> ReleaseResult<Option<u64>> {
  if let Some(number) = ctx.pull_request_number {
    return Ok(Some(number));
  }

  let Some(branch) = ctx.branch.as_deref() else {
    return Ok(None);
  };

  let pulls: Vec<_> = host
    .list_open_pulls_by_head(branch)?
    .into_iter()
    .filter(|pr| pr.head.ref_name == branch)
    .collect();
  if pulls.len() > 1 {
    let numbers: Vec<u64> = pulls.iter().map(|pr| pr.number).collect();
    tracing::warn!(
      branch,
      ?numbers,
      "several open pull requests share this head branch; using the first"
    );
  }
  Ok(pulls.first().map(|pr| pr.number))
}

/// Update the first comment containing `marker`, or create one
pub fn upsert_tracking_comment(
  host: &dyn CodeHost,
  number: u64,
  marker: &str,
  body: &str,
) -> ReleaseResult<CommentOutcome> {
  let existing = host
    .list_issue_comments(number)?
    .into_iter()
    .find(|comment| comment.body().contains(marker));

  match existing {
    Some(comment) => {
      host.update_comment(comment.id, body)?;
      Ok(CommentOutcome::Updated(comment.id))
    }
    None => {
      host.create_comment(number, body)?;
      Ok(CommentOutcome::Created)
    }
  }
}

/// Render and publish the preview comment; never fails the run
pub fn publish_preview_comment(ctx: &ReleaseContext, host: &dyn CodeHost, version: &Version, changelog: &str) {
  println!("💬 Updating release preview comment...");

  let artifacts = match collect_release_assets(&ctx.config.artifacts.release_assets_dir(ctx.root())) {
    Ok(paths) => paths.iter().map(|p| asset_name(p)).collect(),
    Err(e) => {
      tracing::warn!(error = %e, "could not list release artifacts");
      Vec::new()
    }
  };

  let marker = &ctx.config.comment.marker;
  let body = render_comment_body(marker, version, ctx.mode, &artifacts, changelog);

  let result = resolve_pr_number(ctx, host).and_then(|number| match number {
    Some(number) => upsert_tracking_comment(host, number, marker, &body).map(|outcome| Some((number, outcome))),
    None => Ok(None),
  });

  match result {
    Ok(Some((number, CommentOutcome::Created))) => println!("   Created preview comment on PR #{}", number),
    Ok(Some((number, CommentOutcome::Updated(id)))) => {
      println!("   Updated preview comment {} on PR #{}", id, number)
    }
    Ok(None) => println!("   No pull request found for this ref, skipping comment"),
    Err(e) => {
      println!("   ⚠️  Could not publish preview comment: {}", e);
      tracing::warn!(error = %e, "preview comment failed");
    }
  }
}
