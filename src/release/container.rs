//! Container image publishing
//!
//! Targets run strictly in order; the first failure stops the run.

use crate::core::config::ContainersConfig;
use crate::core::error::{PublishError, ReleaseError, ReleaseResult};
use crate::release::mode::{Action, ReleaseMode};
use semver::Version;
use std::process::Command;

/// Publishes one container target
pub trait PublishRunner {
  fn publish(&self, target: &str, version: &Version) -> ReleaseResult<()>;
}

/// Runs the configured command line once per target
pub struct CommandRunner {
  command: Vec<String>,
  env_name: String,
}

impl CommandRunner {
  pub fn new(config: &ContainersConfig, env_name: impl Into<String>) -> Self {
    Self {
      command: config.command.clone(),
      env_name: env_name.into(),
    }
  }

  /// Command line for a target with `{target}` and `{version}` substituted
  pub fn argv(&self, target: &str, version: &Version) -> Vec<String> {
    let version = version.to_string();
    self
      .command
      .iter()
      .map(|arg| arg.replace("{target}", target).replace("{version}", &version))
      .collect()
  }
}

impl PublishRunner for CommandRunner {
  fn publish(&self, target: &str, version: &Version) -> ReleaseResult<()> {
    let argv = self.argv(target, version);
    let Some((program, args)) = argv.split_first() else {
      return Err(ReleaseError::Publish(PublishError::Spawn {
        target: target.to_string(),
        reason: "empty command".to_string(),
      }));
    };

    tracing::debug!(target, ?argv, "running publish command");
    let status = Command::new(program)
      .args(args)
      .env(&self.env_name, version.to_string())
      .status()
      .map_err(|e| {
        ReleaseError::Publish(PublishError::Spawn {
          target: target.to_string(),
          reason: e.to_string(),
        })
      })?;

    if !status.success() {
      return Err(ReleaseError::Publish(PublishError::TargetFailed {
        target: target.to_string(),
        status: status.code(),
      }));
    }
    Ok(())
  }
}

/// A single target as a mode-interpreted action
pub struct ContainerTarget<'a> {
  pub target: &'a str,
  pub version: &'a Version,
  pub runner: &'a dyn PublishRunner,
}

impl Action for ContainerTarget<'_> {
  fn describe(&self) -> String {
    format!("publish container target '{}' at {}", self.target, self.version)
  }

  fn execute(&self) -> ReleaseResult<()> {
    self.runner.publish(self.target, self.version)
  }
}

/// Publish every target in order, stopping at the first failure
pub fn publish_containers(
  mode: ReleaseMode,
  targets: &[String],
  version: &Version,
  runner: &dyn PublishRunner,
) -> ReleaseResult<()> {
  println!("🐳 Publishing {} container target(s)...", targets.len());

  for target in targets {
    let action = ContainerTarget {
      target,
      version,
      runner,
    };
    if let Err(e) = mode.run(&action) {
      tracing::error!(target = %target, error = %e, "container publish failed");
      return Err(e);
    }
    if mode.is_live() {
      println!("   ✅ {}", target);
    }
  }
  Ok(())
}
