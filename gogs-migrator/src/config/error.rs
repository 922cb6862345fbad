//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading the migration settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse settings in '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A required top-level section is absent.
    #[error("Specified configuration file has no `{section}` configuration")]
    MissingSection { section: String },

    /// Required keys are absent from a section.
    #[error("The following keys are missing from the `{section}` configuration: {}", fields.join(", "))]
    MissingFields {
        section: String,
        fields: Vec<String>,
    },

    /// Validation error in the settings.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },
}
