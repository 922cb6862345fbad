//! Issues and pull requests as migrated items.

mod comment;

pub use comment::Comment;

use crate::config::ItemState;
use crate::resolver::{IdentityMap, IssueMap, ReferenceResolver, UserDirectory};
use crate::source::time::unix_to_human_time;
use crate::source::{IssueRecord, PullRequestRecord, SourceError, SourceReader};
use crate::templates::{Branches, ItemContent, TemplateError, TemplateRenderer};

/// Shown when a timestamp is missing.
const UNKNOWN_DATE: &str = "an unknown date";

/// Everything needed to turn Gogs text into GitHub text.
pub struct ContentContext<'a> {
    pub renderer: &'a TemplateRenderer,
    pub resolver: &'a ReferenceResolver,
    pub identities: &'a IdentityMap,
    pub issue_map: &'a IssueMap,
}

impl ContentContext<'_> {
    /// Renders a Gogs user name, or `**unknown**` for deleted users.
    async fn user(&self, name: Option<&str>, directory: &mut dyn UserDirectory) -> String {
        match name {
            Some(name) => self.resolver.user(name, self.identities, directory).await,
            None => self.resolver.format_user("unknown", None),
        }
    }

    /// Renders a comment author. Authors without a mapped account are
    /// looked up by the email stored with the comment.
    async fn author(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        directory: &mut dyn UserDirectory,
    ) -> String {
        let login = match name {
            Some(name) => self.identities.resolve(name, directory).await,
            None => None,
        };
        let login = match (login, email.filter(|e| !e.trim().is_empty())) {
            (None, Some(email)) => directory.find_user_by_email(email).await,
            (login, _) => login,
        };
        self.resolver
            .format_user(name.unwrap_or("unknown"), login.as_deref())
    }

    async fn rewrite(&self, text: &str, directory: &mut dyn UserDirectory) -> String {
        self.resolver
            .rewrite(text, self.issue_map, self.identities, directory)
            .await
    }
}

/// Human readable time, with a placeholder for missing timestamps.
pub(crate) fn human_time(unix: i64) -> String {
    unix_to_human_time(unix).unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Update time worth mentioning: present and later than creation.
pub(crate) fn human_update_time(created: i64, updated: i64) -> Option<String> {
    if updated > created {
        unix_to_human_time(updated)
    } else {
        None
    }
}

/// A pull request: its issue row plus the pull request rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub issue: IssueRecord,
    pub records: Vec<PullRequestRecord>,
}

impl PullRequest {
    /// Head branch; empty if unknown.
    #[must_use]
    pub fn head(&self) -> &str {
        self.records.first().map_or("", |r| r.head_branch.as_str())
    }

    /// Base branch; empty if unknown.
    #[must_use]
    pub fn base(&self) -> &str {
        self.records.first().map_or("", |r| r.base_branch.as_str())
    }
}

/// An issue or pull request read from Gogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigratableItem {
    Issue(IssueRecord),
    PullRequest(PullRequest),
}

impl MigratableItem {
    /// Wraps an issue row, loading pull request data for pull requests.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the pull request rows cannot be read.
    pub async fn load(record: IssueRecord, source: &dyn SourceReader) -> Result<Self, SourceError> {
        if !record.is_pull {
            return Ok(Self::Issue(record));
        }
        let records = source.pull_requests(record.id).await?;
        Ok(Self::PullRequest(PullRequest {
            issue: record,
            records,
        }))
    }

    /// The underlying issue row.
    #[must_use]
    pub fn issue(&self) -> &IssueRecord {
        match self {
            Self::Issue(issue) => issue,
            Self::PullRequest(pull) => &pull.issue,
        }
    }

    /// Gogs issue number.
    #[must_use]
    pub fn index(&self) -> i64 {
        self.issue().index
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.issue().name
    }

    #[must_use]
    pub fn state(&self) -> ItemState {
        ItemState::from_closed(self.issue().is_closed)
    }

    #[must_use]
    pub fn is_pull(&self) -> bool {
        matches!(self, Self::PullRequest(_))
    }

    /// Gogs milestone id, if one is set.
    #[must_use]
    pub fn milestone_id(&self) -> Option<i64> {
        Some(self.issue().milestone_id).filter(|id| *id > 0)
    }

    /// "issue" or "pull request".
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Issue(_) => "issue",
            Self::PullRequest(_) => "pull request",
        }
    }

    /// Head and base branch of a pull request.
    #[must_use]
    pub fn head_base(&self) -> Option<(&str, &str)> {
        match self {
            Self::Issue(_) => None,
            Self::PullRequest(pull) => Some((pull.head(), pull.base())),
        }
    }

    /// GitHub login of the assignee.
    pub async fn assignee_login(
        &self,
        identities: &IdentityMap,
        directory: &mut dyn UserDirectory,
    ) -> Option<String> {
        let assignee = self.issue().assignee.as_deref()?;
        identities.resolve(assignee, directory).await
    }

    async fn content(
        &self,
        cx: &ContentContext<'_>,
        directory: &mut dyn UserDirectory,
        branches: Option<Branches>,
    ) -> Result<String, TemplateError> {
        let issue = self.issue();
        let assignee = match issue.assignee.as_deref() {
            Some(name) => Some(cx.user(Some(name), directory).await),
            None => None,
        };
        let content = ItemContent {
            kind: self.kind().to_string(),
            creator: cx.user(issue.creator.as_deref(), directory).await,
            created: human_time(issue.created_unix),
            updated: human_update_time(issue.created_unix, issue.updated_unix),
            assignee,
            branches,
            body: cx.rewrite(&issue.content, directory).await,
        };
        cx.renderer.render_item(&content)
    }

    /// Body for creating the item as a GitHub issue. Pull requests mention
    /// their branches.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if rendering fails.
    pub async fn issue_content(
        &self,
        cx: &ContentContext<'_>,
        directory: &mut dyn UserDirectory,
    ) -> Result<String, TemplateError> {
        let branches = self.head_base().map(|(head, base)| Branches {
            head: head.to_string(),
            base: base.to_string(),
        });
        self.content(cx, directory, branches).await
    }

    /// Body for creating the item as a GitHub pull request.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if rendering fails.
    pub async fn pull_request_content(
        &self,
        cx: &ContentContext<'_>,
        directory: &mut dyn UserDirectory,
    ) -> Result<String, TemplateError> {
        self.content(cx, directory, None).await
    }

    /// Comments in chronological order, including a merge note for every
    /// merge of a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the comments cannot be read.
    pub async fn load_comments(&self, source: &dyn SourceReader) -> Result<Vec<Comment>, SourceError> {
        let mut comments: Vec<Comment> = source
            .comments(self.issue().id)
            .await?
            .into_iter()
            .map(Comment::from_record)
            .collect();

        if let Self::PullRequest(pull) = self {
            comments.extend(
                pull.records
                    .iter()
                    .filter(|record| record.has_merged && record.merged_unix > 0)
                    .cloned()
                    .map(Comment::MergeNotification),
            );
        }

        comments.sort_by_key(Comment::timestamp);
        Ok(comments)
    }
}
