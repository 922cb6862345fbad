//! Comments on migrated items.

use crate::config::ItemState;
use crate::model::{human_time, human_update_time, ContentContext};
use crate::resolver::UserDirectory;
use crate::source::{CommentRecord, PullRequestRecord};
use crate::templates::{CommentContent, CommentTemplate, MergeContent, TemplateError};

/// Gogs comment type codes.
const REOPEN: i64 = 1;
const CLOSE: i64 = 2;
const COMMIT_REFERENCE: i64 = 4;

/// A comment to post on a migrated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comment {
    /// Plain comment; also used for unknown Gogs types.
    General(CommentRecord),
    /// The item was reopened or closed.
    StateChange {
        record: CommentRecord,
        state: ItemState,
    },
    /// A commit mentioned the item.
    CommitReference(CommentRecord),
    /// A pull request was merged.
    MergeNotification(PullRequestRecord),
}

impl Comment {
    /// Classifies a comment row by its type code.
    #[must_use]
    pub fn from_record(record: CommentRecord) -> Self {
        match record.kind {
            REOPEN => Self::StateChange {
                record,
                state: ItemState::Open,
            },
            CLOSE => Self::StateChange {
                record,
                state: ItemState::Closed,
            },
            COMMIT_REFERENCE => Self::CommitReference(record),
            _ => Self::General(record),
        }
    }

    /// Unix time the comment was made.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::General(record)
            | Self::StateChange { record, .. }
            | Self::CommitReference(record) => record.created_unix,
            Self::MergeNotification(pull) => pull.merged_unix,
        }
    }

    /// State the item moves to, for reopen and close comments.
    #[must_use]
    pub fn state_change(&self) -> Option<ItemState> {
        match self {
            Self::StateChange { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Renders the comment for an item of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if rendering fails.
    pub async fn render(
        &self,
        kind: &str,
        cx: &ContentContext<'_>,
        directory: &mut dyn UserDirectory,
    ) -> Result<String, TemplateError> {
        let (template, record, state, commit) = match self {
            Self::MergeNotification(pull) => {
                let merge = MergeContent {
                    head: pull.head_branch.clone(),
                    base: pull.base_branch.clone(),
                    merge_base: pull.merge_base.clone(),
                    merged_commit: pull.merged_commit_id.clone(),
                    author: cx.user(pull.merger.as_deref(), directory).await,
                    created: human_time(pull.merged_unix),
                };
                return cx.renderer.render_merge(&merge);
            }
            Self::General(record) => (CommentTemplate::General, record, None, None),
            Self::StateChange { record, state } => (
                CommentTemplate::StateChange,
                record,
                Some(state.as_str().to_string()),
                None,
            ),
            Self::CommitReference(record) => (
                CommentTemplate::CommitReference,
                record,
                None,
                Some(record.commit_sha.clone().unwrap_or_default()),
            ),
        };

        let content = CommentContent {
            kind: kind.to_string(),
            author: cx
                .author(record.author.as_deref(), record.email.as_deref(), directory)
                .await,
            created: human_time(record.created_unix),
            updated: human_update_time(record.created_unix, record.updated_unix),
            content: cx.rewrite(&record.content, directory).await,
            state,
            commit,
        };
        cx.renderer.render_comment(template, &content)
    }
}
