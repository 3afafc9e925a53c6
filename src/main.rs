mod commands;
mod core;
mod github;
mod release;

use clap::{Parser, Subcommand};
use crate::core::config::ReleaseConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, print_error};
use crate::release::Specifier;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Version, changelog and publish pipeline for CI
#[derive(Parser)]
#[command(name = "release-tool")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Enable debug logging on stderr
  #[arg(long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve the version for this build and write it to the artifact directory
  Version {
    /// Commit and tag the release (main branch only; default: dry-run)
    #[arg(long)]
    apply: bool,
    /// Override the computed version: major, minor, patch or an explicit version
    #[arg(long)]
    specifier: Option<Specifier>,
  },

  /// Run the release pipeline (version, changelog, PR comment, publish)
  Release {
    /// Override the computed version: major, minor, patch or an explicit version
    #[arg(long)]
    specifier: Option<Specifier>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// stderr logging; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
  let default = if verbose { "release_tool=debug" } else { "release_tool=warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Loaded once; every stage reads the same context
  let config = match ReleaseConfig::load(&root) {
    Ok(config) => config,
    Err(e) => handle_error(e),
  };
  let ctx = ReleaseContext::from_env(&root, config);
  tracing::debug!(
    mode = %ctx.mode,
    is_main = ctx.is_main,
    is_pull_request = ctx.is_pull_request,
    branch = ?ctx.branch,
    "release context"
  );

  let result = match cli.command {
    Commands::Version { apply, specifier } => commands::run_version(&ctx, apply, specifier),
    Commands::Release { specifier } => commands::run_release(&ctx, specifier),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  tracing::error!(error = %err, "release-tool failed");
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
