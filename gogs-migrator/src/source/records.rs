//! Records read from the Gogs database.

use crate::config::ItemState;
use crate::source::time::unix_to_github_time;

/// A Gogs user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUser {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub email: String,
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLabel {
    pub id: i64,
    pub name: String,
    /// Hex color, with or without the leading `#`.
    pub color: String,
}

/// A repository milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMilestone {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub is_closed: bool,
    pub deadline_unix: i64,
}

impl SourceMilestone {
    /// Due date in GitHub's timestamp format, if a deadline is set.
    #[must_use]
    pub fn due_on(&self) -> Option<String> {
        unix_to_github_time(self.deadline_unix)
    }

    /// Open/closed state of the milestone.
    #[must_use]
    pub fn state(&self) -> ItemState {
        ItemState::from_closed(self.is_closed)
    }
}

/// An issue row; pull requests are issues with `is_pull` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    /// Database id, used to look up comments, labels and pull request data.
    pub id: i64,
    /// Per-repository issue number (`#index`).
    pub index: i64,
    pub name: String,
    pub content: String,
    /// Zero when no milestone is set.
    pub milestone_id: i64,
    pub is_closed: bool,
    pub is_pull: bool,
    pub created_unix: i64,
    pub updated_unix: i64,
    pub creator: Option<String>,
    pub assignee: Option<String>,
}

/// Branch and merge data of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub head_branch: String,
    pub base_branch: String,
    pub has_merged: bool,
    pub merge_base: String,
    pub merged_commit_id: String,
    /// Zero when the pull request was never merged.
    pub merged_unix: i64,
    pub merger: Option<String>,
}

/// A comment row. `kind` is the raw Gogs comment type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub kind: i64,
    pub content: String,
    pub commit_sha: Option<String>,
    pub created_unix: i64,
    pub updated_unix: i64,
    pub author: Option<String>,
    pub email: Option<String>,
}
