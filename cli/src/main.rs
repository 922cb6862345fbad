//! CLI for the Gogs to GitHub migrator.
//!
//! Reads a settings file, connects to the Gogs database and the target
//! GitHub repository, and migrates labels, milestones, issues, pull requests
//! and comments.

mod prompt;

use clap::Parser;
use gogs_migrator::{run_migration, MigrationError, RunSummary, Settings};
use prompt::ConsolePrompt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Gogs Migrator - Move issues, pull requests, milestones and labels from Gogs to GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the settings file.
    #[arg(long, short, default_value = "migration-settings.toml")]
    config: PathBuf,

    /// Token used instead of GitHub App authentication.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Preview the migration without changing anything on GitHub.
    #[arg(long)]
    dry_run: bool,

    /// Manual `gogs-user github-login` mapping file.
    #[arg(long)]
    accounts_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Err(e) if e.is_abort() => {
            info!("Migration aborted");
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, MigrationError> {
    let mut settings = Settings::load(&args.config)?;
    if let Some(token) = args.token.filter(|t| !t.trim().is_empty()) {
        settings.github.token = Some(token);
    }
    if args.dry_run {
        settings.migration.dryrun = true;
    }
    if let Some(path) = args.accounts_file {
        settings.migration.accounts_file = path;
    }

    let mut prompt = ConsolePrompt::new();
    let password = if settings.gogs.no_password {
        None
    } else {
        Some(prompt.password(&settings.gogs.username, &settings.gogs.host)?)
    };

    run_migration(settings, Box::new(prompt), password.as_deref()).await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Labels migrated: {}", summary.labels_migrated);
    println!("  Milestones migrated: {}", summary.milestones_migrated);
    println!("  Issues created: {}", summary.issues_created);
    println!("  PRs created: {}", summary.pull_requests_created);
    println!("  PRs created as issues: {}", summary.pull_requests_as_issues);
    println!("  Items skipped: {}", summary.items_skipped);
    println!("  Items failed: {}", summary.items_failed);
    println!("  Comments created: {}", summary.comments_created);
    println!("  Comments failed: {}", summary.comments_failed);
    println!("  State changes replayed: {}", summary.state_changes);
}
