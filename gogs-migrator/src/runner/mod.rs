//! Orchestrates a complete migration run.

mod error;
mod migrator;

pub use error::MigrationError;
pub use migrator::Migrator;

use crate::config::{ConfigError, Settings};
use crate::github::{
    authenticate_installation, load_app_key, sign_app_jwt, verify_repository_access,
    ClientOptions, GitHubClient, OctocrabTransport, Operator, Transport,
};
use crate::rate_limit::unix_now;
use crate::source::GogsDatabase;
use crate::summary::RunSummary;
use tracing::info;

/// Connects to both sides and migrates everything the settings enable.
///
/// # Errors
///
/// Returns [`MigrationError`] on fatal configuration, authentication or
/// database errors, or when the operator aborts.
pub async fn run_migration(
    settings: Settings,
    operator: Box<dyn Operator>,
    password: Option<&str>,
) -> Result<RunSummary, MigrationError> {
    let client = connect_github(&settings, operator).await?;
    let database = GogsDatabase::connect(&settings.gogs, password).await?;

    let mut migrator = Migrator::new(database, client, settings.migration)?;
    migrator.run().await
}

/// Builds the GitHub client, authenticating as a GitHub App unless a static
/// token is configured.
///
/// # Errors
///
/// Returns [`MigrationError`] if authentication fails.
pub async fn connect_github(
    settings: &Settings,
    mut operator: Box<dyn Operator>,
) -> Result<GitHubClient, MigrationError> {
    let github = &settings.github;
    let migration = &settings.migration;

    let (transport, pull_requests_enabled): (Box<dyn Transport>, bool) = match &github.token {
        Some(token) => {
            info!("Authenticating with token");
            let transport = OctocrabTransport::with_token(token.clone())?;
            (Box::new(transport), migration.create_pull_requests())
        }
        None => {
            let (Some(app_id), Some(key_file)) = (github.app_id, github.key_file.as_ref()) else {
                return Err(ConfigError::MissingFields {
                    section: "github".to_string(),
                    fields: vec!["app_id".to_string(), "key_file".to_string()],
                }
                .into());
            };

            info!(app_id, "Authenticating as GitHub App");
            let key = load_app_key(key_file)?;
            let jwt = sign_app_jwt(app_id, &key, unix_now())?;
            let app = OctocrabTransport::with_token(jwt)?;
            let installation =
                authenticate_installation(&app, migration, operator.as_mut()).await?;

            let transport = OctocrabTransport::with_token(installation.token)?;
            verify_repository_access(&transport, &github.repository).await?;
            (
                Box::new(transport),
                installation.pull_requests_enabled,
            )
        }
    };

    let options = ClientOptions {
        dry_run: migration.dryrun,
        slow_mode: migration.slow,
        pull_requests_enabled,
        ..ClientOptions::default()
    };
    Ok(GitHubClient::new(
        transport,
        operator,
        &github.username,
        &github.repository,
        options,
    ))
}
