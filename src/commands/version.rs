//! `release-tool version`

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::GitWorkspace;
use crate::release::version::{Specifier, resolve_version};

/// Resolve the version, write `.artifacts/version` and export it to the CI env file.
///
/// On the main branch `apply` commits the release and creates the `v<version>` tag.
pub fn run_version(ctx: &ReleaseContext, apply: bool, specifier: Option<Specifier>) -> ReleaseResult<()> {
  if apply && ctx.is_preview() {
    println!("⚠️  --apply ignored: preview builds are never committed or tagged");
  }

  let workspace = GitWorkspace::new(ctx);
  resolve_version(ctx, &workspace, !apply, specifier)?;
  Ok(())
}
