//! Read access to the Gogs database.
//!
//! The migration only ever reads from Gogs. [`SourceReader`] describes the
//! fixed set of row shapes the migration needs, scoped to a single
//! repository; [`GogsDatabase`] serves them from MySQL.

mod error;
mod mysql;
mod records;
pub mod time;

pub use error::SourceError;
pub use mysql::GogsDatabase;
pub use records::{
    CommentRecord, IssueRecord, PullRequestRecord, SourceLabel, SourceMilestone, SourceUser,
};

use async_trait::async_trait;

/// Read-only view of one Gogs repository.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// All users of the Gogs instance.
    async fn users(&self) -> Result<Vec<SourceUser>, SourceError>;

    /// Users that took part in issues of the repository.
    async fn repository_users(&self) -> Result<Vec<SourceUser>, SourceError>;

    /// Labels of the repository.
    async fn labels(&self) -> Result<Vec<SourceLabel>, SourceError>;

    /// Milestones of the repository, oldest first.
    async fn milestones(&self) -> Result<Vec<SourceMilestone>, SourceError>;

    /// Issues and pull requests of the repository, in creation order.
    async fn issues(&self) -> Result<Vec<IssueRecord>, SourceError>;

    /// Pull request rows for the issue with database id `issue_id`.
    async fn pull_requests(&self, issue_id: i64) -> Result<Vec<PullRequestRecord>, SourceError>;

    /// Comments on the issue with database id `issue_id`, oldest first.
    async fn comments(&self, issue_id: i64) -> Result<Vec<CommentRecord>, SourceError>;

    /// Names of the labels attached to the issue with database id `issue_id`.
    async fn issue_labels(&self, issue_id: i64) -> Result<Vec<String>, SourceError>;
}
