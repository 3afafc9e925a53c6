//! Changelog generation from conventional commits
//!
//! The parser is built on winnow (not regex) so malformed subjects degrade to
//! "Other" entries instead of failing the run.

use crate::core::vcs::CommitInfo;
use crate::release::version::{ChangelogOutput, VersionRequest, VersionSource};
use std::collections::BTreeMap;
use std::fmt;

/// Substituted when changelog generation fails
pub const CHANGELOG_PLACEHOLDER: &str = "_Changelog generation failed._";

/// A parsed conventional commit
///
/// Format: `<type>(<scope>)!: <description>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
  /// Commit type (feat, fix, chore, docs, etc.)
  pub commit_type: CommitType,
  /// Optional scope (e.g., "auth", "api", "core")
  pub scope: Option<String>,
  /// Short description
  pub description: String,
  /// Full commit body (optional)
  #[allow(dead_code)] // Parsed but not rendered; entries show the subject line only
  pub body: Option<String>,
  /// Breaking change footer; empty string when only `!` was used
  pub breaking_change: Option<String>,
  /// Other footers (e.g., "Closes #123")
  pub footers: Vec<(String, String)>,
}

/// Conventional commit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitType {
  Feat,
  Fix,
  Docs,
  Style,
  Refactor,
  Perf,
  Test,
  Build,
  Ci,
  Chore,
  Revert,
  Other,
}

impl CommitType {
  /// Map a type keyword to a commit type
  pub fn from_keyword(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "feat" | "feature" => Self::Feat,
      "fix" => Self::Fix,
      "docs" | "doc" => Self::Docs,
      "style" => Self::Style,
      "refactor" => Self::Refactor,
      "perf" | "performance" => Self::Perf,
      "test" | "tests" => Self::Test,
      "build" => Self::Build,
      "ci" => Self::Ci,
      "chore" => Self::Chore,
      "revert" => Self::Revert,
      _ => Self::Other,
    }
  }

  /// Get the display name for this commit type
  pub fn display_name(&self) -> &'static str {
    match self {
      Self::Feat => "Features",
      Self::Fix => "Bug Fixes",
      Self::Docs => "Documentation",
      Self::Style => "Style",
      Self::Refactor => "Refactoring",
      Self::Perf => "Performance",
      Self::Test => "Tests",
      Self::Build => "Build",
      Self::Ci => "CI",
      Self::Chore => "Chores",
      Self::Revert => "Reverts",
      Self::Other => "Other",
    }
  }
}

impl fmt::Display for CommitType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.display_name())
  }
}

/// Section order in rendered output
const SECTION_ORDER: [CommitType; 12] = [
  CommitType::Feat,
  CommitType::Fix,
  CommitType::Perf,
  CommitType::Docs,
  CommitType::Refactor,
  CommitType::Test,
  CommitType::Build,
  CommitType::Ci,
  CommitType::Chore,
  CommitType::Style,
  CommitType::Revert,
  CommitType::Other,
];

/// Changelog entry for one version
#[derive(Debug, Clone)]
pub struct Changelog {
  pub version: String,
  /// Release date (ISO 8601)
  pub date: String,
  pub commits_by_type: BTreeMap<CommitType, Vec<ConventionalCommit>>,
}

impl Changelog {
  pub fn new(version: String, date: String) -> Self {
    Self {
      version,
      date,
      commits_by_type: BTreeMap::new(),
    }
  }

  /// Build a changelog from raw commits; non-conventional ones land under "Other"
  pub fn from_commits(version: String, date: String, commits: &[CommitInfo]) -> Self {
    let mut changelog = Self::new(version, date);
    for commit in commits {
      let parsed = ConventionalCommit::parse(&commit.message).unwrap_or_else(|| ConventionalCommit {
        commit_type: CommitType::Other,
        scope: None,
        description: commit.message.lines().next().unwrap_or("").trim().to_string(),
        body: None,
        breaking_change: None,
        footers: Vec::new(),
      });
      changelog.add_commit(parsed);
    }
    changelog
  }

  pub fn add_commit(&mut self, commit: ConventionalCommit) {
    self.commits_by_type.entry(commit.commit_type).or_default().push(commit);
  }

  pub fn is_empty(&self) -> bool {
    self.commits_by_type.values().all(Vec::is_empty)
  }

  /// Render as markdown
  pub fn to_markdown(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("## [{}] - {}\n\n", self.version, self.date));

    if self.is_empty() {
      output.push_str("_No changes since the previous release._\n");
      return output;
    }

    for commit_type in &SECTION_ORDER {
      let Some(commits) = self.commits_by_type.get(commit_type) else {
        continue;
      };
      if commits.is_empty() {
        continue;
      }

      output.push_str(&format!("### {}\n\n", commit_type.display_name()));

      for commit in commits {
        let scope_str = commit
          .scope
          .as_ref()
          .map(|s| format!("**{}**: ", s))
          .unwrap_or_default();

        output.push_str(&format!("- {}{}{}\n", scope_str, commit.description, commit.issue_refs()));

        if let Some(ref breaking) = commit.breaking_change {
          if !breaking.is_empty() {
            output.push_str(&format!("  - **BREAKING**: {}\n", breaking));
          } else {
            output.push_str("  - **BREAKING CHANGE**\n");
          }
        }
      }

      output.push('\n');
    }

    output
  }
}

impl ConventionalCommit {
  /// ` (Closes #12, Refs #40)` from issue-linking footers
  fn issue_refs(&self) -> String {
    let refs: Vec<String> = self
      .footers
      .iter()
      .filter(|(key, _)| {
        ["closes", "fixes", "refs", "resolves"]
          .iter()
          .any(|k| key.eq_ignore_ascii_case(k))
      })
      .map(|(key, value)| format!("{} {}", key, value))
      .collect();

    if refs.is_empty() {
      String::new()
    } else {
      format!(" ({})", refs.join(", "))
    }
  }

  /// Check if this commit is a breaking change
  pub fn is_breaking(&self) -> bool {
    self.breaking_change.is_some()
  }

  /// Parse a conventional commit from a git commit message
  ///
  /// Returns None if the message doesn't follow conventional commit format.
  pub fn parse(message: &str) -> Option<Self> {
    use winnow::ascii::{alphanumeric1, space0};
    use winnow::combinator::{opt, preceded, terminated};
    use winnow::prelude::*;
    use winnow::token::take_till;

    let (first_line, rest) = message.split_once('\n').unwrap_or((message, ""));

    // type(scope)!: description
    let mut parser = (
      alphanumeric1::<_, ()>.map(|s: &str| CommitType::from_keyword(s)),
      opt(preceded('(', terminated(take_till(1.., ')'), ')'))),
      opt('!'),
      ':',
      space0,
      take_till(0.., ['\n', '\r']),
    );

    let Ok((commit_type, scope, breaking_indicator, _, _, description)) = parser.parse(first_line) else {
      return None;
    };

    let mut body_lines = Vec::new();
    let mut breaking_change = None;
    let mut footers = Vec::new();
    let mut in_body = true;
    let mut seen_empty_line = false;

    for line in rest.lines() {
      let trimmed = line.trim();

      // Empty lines separate body from footers
      if trimmed.is_empty() {
        seen_empty_line = true;
        continue;
      }

      if seen_empty_line && let Some((key, value)) = split_footer(trimmed) {
        if key.eq_ignore_ascii_case("BREAKING CHANGE") || key.eq_ignore_ascii_case("BREAKING-CHANGE") {
          breaking_change = Some(value.to_string());
        } else {
          footers.push((key.to_string(), value.to_string()));
        }
        in_body = false;
        continue;
      }

      if in_body {
        body_lines.push(line);
        seen_empty_line = false;
      }
    }

    if breaking_change.is_none() && breaking_indicator.is_some() {
      breaking_change = Some(String::new());
    }

    let body = if body_lines.is_empty() {
      None
    } else {
      Some(body_lines.join("\n"))
    };

    Some(Self {
      commit_type,
      scope: scope.map(|s: &str| s.to_string()),
      description: description.trim().to_string(),
      body,
      breaking_change,
      footers,
    })
  }
}

/// Split a footer line: `Token: value` or `Token #value`
fn split_footer(line: &str) -> Option<(&str, &str)> {
  let is_token = |key: &str| !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_');

  if let Some((key, value)) = line.split_once(':') {
    let key = key.trim();
    if is_token(key) || key.eq_ignore_ascii_case("BREAKING CHANGE") {
      return Some((key, value.trim()));
    }
  }

  let (key, _) = line.split_once(" #")?;
  is_token(key).then(|| (key, line[key.len() + 1..].trim()))
}

/// Flatten a generator result into display text
pub fn flatten_output(output: ChangelogOutput) -> String {
  match output {
    ChangelogOutput::Text(text) => text,
    ChangelogOutput::PerProject(projects) => projects
      .into_values()
      .map(|text| text.trim_end().to_string())
      .collect::<Vec<_>>()
      .join("\n\n"),
  }
}

/// Produce changelog text for `version` without touching the repository.
///
/// Never fails: any generator error is logged and replaced by the placeholder.
pub fn generate_preview_changelog(source: &dyn VersionSource, version: &semver::Version) -> String {
  println!("📝 Generating changelog for {}...", version);
  match source.compute_changelog(version, &VersionRequest::dry_run()) {
    Ok(output) => flatten_output(output),
    Err(e) => {
      println!("   ⚠️  Changelog generation failed: {}", e);
      tracing::warn!(error = %e, "changelog generation failed");
      CHANGELOG_PLACEHOLDER.to_string()
    }
  }
}
