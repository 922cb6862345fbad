//! GitHub client error types.

use thiserror::Error;

/// Errors that stop a GitHub operation.
///
/// Ordinary API failures are not errors: they are handed to the
/// [`Operator`](super::Operator) and end in "no identifier" when not retried.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// GitHub API or transport error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// Failed to serialize a request payload.
    #[error("Failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The operator chose to abort the migration.
    #[error("Migration aborted by operator")]
    Aborted,
}

/// Errors raised while authenticating as a GitHub App.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The private key file does not exist.
    #[error("Key file {path} does not exist")]
    KeyFileNotFound { path: String },

    /// The private key file could not be read.
    #[error("Failed to read key file '{path}': {source}")]
    KeyFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The private key could not be used to sign a token.
    #[error("Invalid GitHub App key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    /// GitHub refused the app credentials.
    #[error("GitHub returned the following message: {message}. Please check the provided GitHub App ID and private key file")]
    Rejected { message: String },

    /// The app has no installation.
    #[error("No installations found for GitHub App. Assign an installation to this app before continuing")]
    NoInstallation,

    /// The installation token lacks a required write permission.
    #[error("Enable write permissions for {permission} in the GitHub App before using this application")]
    InsufficientPermissions { permission: String },

    /// The installation does not cover the target repository.
    #[error("The GitHub App is not installed yet, or does not have access to the repository {repository}")]
    RepositoryNotAccessible { repository: String },

    /// The operator declined to continue.
    #[error("Migration aborted by operator")]
    Aborted,

    /// Transport failure during authentication.
    #[error(transparent)]
    GitHub(#[from] GitHubError),
}
