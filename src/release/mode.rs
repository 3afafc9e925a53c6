//! Live vs plan execution
//!
//! Side effects are expressed as [`Action`]s. The mode decides once, in
//! [`ReleaseMode::run`], whether an action is described or executed.

use crate::core::error::ReleaseResult;

/// Whether side effects are performed or only described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
  /// Perform side effects
  Live,
  /// Describe side effects, change nothing remote
  Plan,
}

impl ReleaseMode {
  /// Derive the mode from the `RELEASE_LIVE` signal; only the literal "true" is live
  pub fn from_flag(flag: Option<&str>) -> Self {
    match flag {
      Some("true") => ReleaseMode::Live,
      _ => ReleaseMode::Plan,
    }
  }

  pub fn is_live(self) -> bool {
    self == ReleaseMode::Live
  }

  /// Human label used in logs and the preview comment
  pub fn label(self) -> &'static str {
    match self {
      ReleaseMode::Live => "live",
      ReleaseMode::Plan => "plan (dry-run)",
    }
  }

  /// Interpret an action under this mode
  pub fn run(self, action: &dyn Action) -> ReleaseResult<()> {
    match self {
      ReleaseMode::Plan => {
        println!("   💡 Would {}", action.describe());
        Ok(())
      }
      ReleaseMode::Live => {
        tracing::debug!(action = %action.describe(), "executing");
        action.execute()
      }
    }
  }
}

impl std::fmt::Display for ReleaseMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// A side effect with a plan-mode description
pub trait Action {
  /// Imperative phrase, e.g. "publish container target 'api'"
  fn describe(&self) -> String;

  /// Perform the side effect
  fn execute(&self) -> ReleaseResult<()>;
}
