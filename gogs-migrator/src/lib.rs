#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod config;
pub mod github;
pub mod model;
pub mod rate_limit;
pub mod resolver;
pub mod runner;
pub mod source;
pub mod summary;
pub mod templates;

pub use config::{ConfigError, GatePath, ItemState, MigrationSettings, Property, Settings};
pub use github::{
    AuthError, ClientOptions, FailureDecision, FailureReport, GitHubClient, GitHubError, Operator,
    Transport,
};
pub use model::{Comment, MigratableItem};
pub use resolver::{IdentityMap, IssueMap, ReferenceResolver, NOT_MIGRATED};
pub use runner::{connect_github, run_migration, MigrationError, Migrator};
pub use source::{GogsDatabase, SourceError, SourceReader};
pub use summary::{ItemOutcome, RunSummary};
pub use templates::{TemplateError, TemplateRenderer};
