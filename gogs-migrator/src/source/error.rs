//! Source database error types.

use thiserror::Error;

/// Errors that can occur while reading the Gogs database.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Could not connect or authenticate to the database.
    #[error("Could not connect to Gogs database at {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: sqlx::Error,
    },

    /// The configured repository name does not exist.
    #[error("Repository '{name}' not found in Gogs database")]
    RepositoryNotFound { name: String },

    /// A query failed.
    #[error("Query for {what} failed: {source}")]
    Query {
        what: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The database password could not be read from the terminal.
    #[error("Failed to read database password: {0}")]
    Password(#[source] std::io::Error),

    /// Failed to read the manual account mapping file.
    #[error("Failed to read accounts file '{path}': {source}")]
    AccountsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
