//! GitHub side of the migration.
//!
//! All API traffic goes through a [`Transport`]; [`GitHubClient`] adds rate
//! limit waits, dry-run answers, caches and operator-driven recovery on
//! top of it.

mod app_auth;
mod client;
mod error;
mod operator;
mod payloads;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use app_auth::{
    authenticate_installation, load_app_key, sign_app_jwt, verify_repository_access,
    InstallationToken,
};
pub use client::{ClientOptions, GitHubClient, DRY_RUN_NUMBER};
pub use error::{AuthError, GitHubError};
pub use operator::{FailureDecision, FailureReport, Operator};
pub use payloads::{
    drop_rejected_assignees, number_field, rejected_assignees, IssueUpdate, NewIssue,
    NewMilestone, NewPullRequest, RemoteLabel,
};
pub use transport::{ApiRequest, ApiResponse, Method, OctocrabTransport, Transport};
