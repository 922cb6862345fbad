//! Migration settings loading.
//!
//! This module parses the TOML settings file, reports every missing required
//! key at once, and exposes the per-state migration gates.

mod error;
mod gates;
mod settings;

pub use error::ConfigError;
pub use gates::{GatePath, ItemState, Property, PropertyGates, PullRequestGates};
pub use settings::{GitHubSettings, GogsSettings, MigrationSettings, RepositoryRef, Settings};

use std::path::Path;
use tracing::{debug, info};

/// Required keys per top-level section.
const REQUIRED_FIELDS: [(&str, &[&str]); 2] = [
    ("gogs", &["host", "database", "username", "repository"]),
    ("github", &["username", "repository"]),
];

/// Keys required in `[github]` when no static `token` is given.
const APP_FIELDS: [&str; 2] = ["app_id", "key_file"];

impl Settings {
    /// Loads the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if a
    /// required section or key is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading settings");

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parses settings from TOML text. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML, if a required
    /// section or key is missing, or if a value has the wrong type.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::TomlError {
            path: origin.to_string(),
            source: e,
        })?;

        verify_required_fields(&table)?;

        let settings: Self = toml::from_str(content).map_err(|e| ConfigError::TomlError {
            path: origin.to_string(),
            source: e,
        })?;

        settings.validate(origin)?;
        debug!(
            dry_run = settings.migration.dryrun,
            labels = settings.migration.labels,
            "Settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self, origin: &str) -> Result<(), ConfigError> {
        if let Some(language) = &self.migration.default_code_language {
            if language.trim().is_empty() || language.contains('`') {
                return Err(ConfigError::ValidationError {
                    path: origin.to_string(),
                    message: format!("default_code_language is not a valid tag: {language:?}"),
                });
            }
        }

        if self.github.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                path: origin.to_string(),
                message: "github.token must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Checks that every required section and key is present, reporting all
/// missing keys of a section together.
fn verify_required_fields(table: &toml::Table) -> Result<(), ConfigError> {
    for (section, fields) in REQUIRED_FIELDS {
        let Some(values) = table.get(section).and_then(toml::Value::as_table) else {
            return Err(ConfigError::MissingSection {
                section: section.to_string(),
            });
        };

        let mut missing: Vec<String> = fields
            .iter()
            .filter(|field| !values.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        if section == "github" && !values.contains_key("token") {
            missing.extend(
                APP_FIELDS
                    .iter()
                    .filter(|field| !values.contains_key(**field))
                    .map(|field| field.to_string()),
            );
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingFields {
                section: section.to_string(),
                fields: missing,
            });
        }
    }

    Ok(())
}
