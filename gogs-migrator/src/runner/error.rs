//! Runner error types.

use crate::config::ConfigError;
use crate::github::{AuthError, GitHubError};
use crate::source::SourceError;
use crate::templates::TemplateError;

/// Errors that end a migration run.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Settings file errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Gogs database errors.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// GitHub API errors, including an operator abort.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// GitHub App authentication errors.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Content rendering errors.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The operator declined to continue.
    #[error("Migration aborted by operator")]
    Aborted,
}

impl MigrationError {
    /// Returns true if the operator stopped the run.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            Self::Aborted | Self::GitHub(GitHubError::Aborted) | Self::Auth(AuthError::Aborted)
        )
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_abort() {
            return 0;
        }
        match self {
            Self::Config(_) => 10,
            Self::Auth(AuthError::NoInstallation) => 3,
            Self::Auth(AuthError::InsufficientPermissions { .. }) => 4,
            Self::Auth(AuthError::KeyFileNotFound { .. }) => 5,
            Self::Auth(AuthError::RepositoryNotAccessible { .. }) => 6,
            Self::Auth(_) => 2,
            _ => 1,
        }
    }
}
