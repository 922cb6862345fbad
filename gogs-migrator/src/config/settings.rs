//! Settings file deserialization.

use crate::config::{GatePath, ItemState, Property, PropertyGates, PullRequestGates};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete contents of the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Source database connection.
    pub gogs: GogsSettings,

    /// Target repository and authentication.
    pub github: GitHubSettings,

    /// What to migrate and how.
    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Connection details of the Gogs MySQL database.
#[derive(Debug, Clone, Deserialize)]
pub struct GogsSettings {
    /// Database host.
    pub host: String,

    /// MySQL port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database (schema) name.
    pub database: String,

    /// Database user.
    pub username: String,

    /// Repository to migrate, by name or by numeric id.
    pub repository: RepositoryRef,

    /// Connect without prompting for a password.
    #[serde(default)]
    pub no_password: bool,
}

pub(crate) fn default_port() -> u16 {
    3306
}

/// A Gogs repository, either looked up by name or given by id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RepositoryRef {
    /// Numeric repository id.
    Id(i64),
    /// Repository name, matched against the lowercase name.
    Name(String),
}

/// Target repository and the credentials used to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSettings {
    /// Owner (user or organization) of the target repository.
    pub username: String,

    /// Name of the target repository.
    pub repository: String,

    /// GitHub App id used for app authentication.
    pub app_id: Option<u64>,

    /// Path to the GitHub App private key (PEM).
    pub key_file: Option<PathBuf>,

    /// Static token used instead of app authentication.
    pub token: Option<String>,
}

/// The `[migration]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationSettings {
    /// Migrate repository labels.
    #[serde(default)]
    pub labels: bool,

    /// Rehearse without changing anything on GitHub.
    #[serde(default = "default_true")]
    pub dryrun: bool,

    /// Sleep after every successful mutating call.
    #[serde(default)]
    pub slow: bool,

    /// Render live `@mentions` instead of profile links.
    #[serde(default)]
    pub mentions: bool,

    /// Language tag for implicit code blocks; normalization is off when unset.
    pub default_code_language: Option<String>,

    /// Check that every repository user maps to a GitHub account first.
    #[serde(default = "default_true")]
    pub check_users: bool,

    /// Manual `gogs-user github-login` mapping file.
    #[serde(default = "default_accounts_file")]
    pub accounts_file: PathBuf,

    /// Gates for plain issues.
    #[serde(default)]
    pub issues: PropertyGates,

    /// Gates for pull requests.
    #[serde(default)]
    pub pull_requests: PullRequestGates,
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_accounts_file() -> PathBuf {
    PathBuf::from("github-accounts")
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            labels: false,
            dryrun: true,
            slow: false,
            mentions: false,
            default_code_language: None,
            check_users: true,
            accounts_file: default_accounts_file(),
            issues: PropertyGates::default(),
            pull_requests: PullRequestGates::default(),
        }
    }
}

impl MigrationSettings {
    /// Checks whether an item in `state` should be migrated, or have the given
    /// property set, according to the gate at `path`.
    #[must_use]
    pub fn allows(&self, path: GatePath, state: ItemState) -> bool {
        match path {
            GatePath::Issues(p) => self.issues.allows(p, state),
            GatePath::PullRequests(p) => self.pull_requests.gates.allows(p, state),
            GatePath::PullRequestsAsIssue(p) => self.pull_requests.as_issue.allows(p, state),
        }
    }

    /// Gate path of a property for an item that is created as a plain issue.
    ///
    /// Pull requests that could not be created as pull requests use the
    /// `pull_requests.as_issue` gates, everything else the `issues` gates.
    #[must_use]
    pub fn issue_gate(is_pull: bool, property: Property) -> GatePath {
        if is_pull {
            GatePath::PullRequestsAsIssue(property)
        } else {
            GatePath::Issues(property)
        }
    }

    /// Returns true if any milestone gate is enabled.
    #[must_use]
    pub fn migrate_milestones(&self) -> bool {
        !self.issues.milestones.is_empty()
            || !self.pull_requests.gates.milestones.is_empty()
            || !self.pull_requests.as_issue.milestones.is_empty()
    }

    /// Returns true if plain issues are migrated in any state.
    #[must_use]
    pub fn migrate_issues(&self) -> bool {
        !self.issues.migrate.is_empty()
    }

    /// Returns true if pull requests are migrated in any state, as pull
    /// requests or as issues.
    #[must_use]
    pub fn migrate_pull_requests(&self) -> bool {
        !self.pull_requests.gates.migrate.is_empty()
            || !self.pull_requests.as_issue.migrate.is_empty()
    }

    /// Returns true if real pull requests are attempted in any state.
    #[must_use]
    pub fn create_pull_requests(&self) -> bool {
        !self.pull_requests.gates.migrate.is_empty()
    }
}
