//! MySQL implementation of [`SourceReader`].

use crate::config::{GogsSettings, RepositoryRef};
use crate::source::{
    CommentRecord, IssueRecord, PullRequestRecord, SourceError, SourceLabel, SourceMilestone,
    SourceReader, SourceUser,
};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

const USERS_QUERY: &str = "SELECT DISTINCT id, name, full_name, email FROM `user`";

const REPOSITORY_USERS_QUERY: &str = "
    SELECT DISTINCT user.id, user.name, user.full_name, user.email
    FROM `user`
    INNER JOIN `issue_user` ON user.id = issue_user.uid
    WHERE issue_user.repo_id = ?";

const LABELS_QUERY: &str = "SELECT id, name, color FROM `label` WHERE repo_id = ? ORDER BY id ASC";

const MILESTONES_QUERY: &str = "
    SELECT id, name, content,
        CAST(is_closed AS SIGNED) AS is_closed,
        CAST(deadline_unix AS SIGNED) AS deadline_unix
    FROM `milestone`
    WHERE repo_id = ?
    ORDER BY id ASC";

const ISSUES_QUERY: &str = "
    SELECT issue.id, CAST(issue.`index` AS SIGNED) AS issue_index, issue.name, issue.content,
        CAST(issue.milestone_id AS SIGNED) AS milestone_id,
        CAST(issue.is_closed AS SIGNED) AS is_closed,
        CAST(issue.is_pull AS SIGNED) AS is_pull,
        CAST(issue.created_unix AS SIGNED) AS created_unix,
        CAST(issue.updated_unix AS SIGNED) AS updated_unix,
        creator.name AS creator, assigned.name AS assignee
    FROM issue
    LEFT JOIN user creator ON issue.poster_id = creator.id
    LEFT JOIN user assigned ON issue.assignee_id = assigned.id
    WHERE issue.repo_id = ?
    ORDER BY issue.created_unix ASC";

const PULL_REQUESTS_QUERY: &str = "
    SELECT pull_request.head_branch, pull_request.base_branch,
        CAST(pull_request.has_merged AS SIGNED) AS has_merged,
        pull_request.merge_base, pull_request.merged_commit_id,
        CAST(pull_request.merged_unix AS SIGNED) AS merged_unix,
        user.name AS merger
    FROM pull_request
    LEFT JOIN user ON pull_request.merger_id = user.id
    WHERE pull_request.issue_id = ?";

const COMMENTS_QUERY: &str = "
    SELECT CAST(comment.type AS SIGNED) AS kind, comment.content, comment.commit_sha,
        CAST(comment.created_unix AS SIGNED) AS created_unix,
        CAST(comment.updated_unix AS SIGNED) AS updated_unix,
        user.name AS author, user.email
    FROM comment
    LEFT JOIN user ON comment.poster_id = user.id
    WHERE comment.issue_id = ?
    ORDER BY comment.created_unix ASC";

const ISSUE_LABELS_QUERY: &str = "
    SELECT DISTINCT label.name
    FROM `issue_label`
    LEFT JOIN label ON label.id = issue_label.label_id
    WHERE issue_label.issue_id = ?";

const REPOSITORY_ID_QUERY: &str = "SELECT `id` FROM `repository` WHERE `lower_name` = ?";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
}

impl From<UserRow> for SourceUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_default(),
            full_name: row.full_name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
        }
    }
}

#[derive(FromRow)]
struct LabelRow {
    id: i64,
    name: String,
    color: Option<String>,
}

#[derive(FromRow)]
struct MilestoneRow {
    id: i64,
    name: String,
    content: Option<String>,
    is_closed: i64,
    deadline_unix: i64,
}

#[derive(FromRow)]
struct IssueRow {
    id: i64,
    issue_index: i64,
    name: String,
    content: Option<String>,
    milestone_id: i64,
    is_closed: i64,
    is_pull: i64,
    created_unix: i64,
    updated_unix: i64,
    creator: Option<String>,
    assignee: Option<String>,
}

#[derive(FromRow)]
struct PullRequestRow {
    head_branch: Option<String>,
    base_branch: Option<String>,
    has_merged: i64,
    merge_base: Option<String>,
    merged_commit_id: Option<String>,
    merged_unix: Option<i64>,
    merger: Option<String>,
}

#[derive(FromRow)]
struct CommentRow {
    kind: i64,
    content: Option<String>,
    commit_sha: Option<String>,
    created_unix: i64,
    updated_unix: i64,
    author: Option<String>,
    email: Option<String>,
}

/// Read-only access to one repository in a Gogs MySQL database.
pub struct GogsDatabase {
    pool: MySqlPool,
    repo_id: i64,
}

impl GogsDatabase {
    /// Connects to the database and resolves the configured repository.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the connection fails or the repository
    /// name is unknown.
    pub async fn connect(
        settings: &GogsSettings,
        password: Option<&str>,
    ) -> Result<Self, SourceError> {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .database(&settings.database);
        if let Some(password) = password {
            options = options.password(password);
        } else {
            debug!("Connecting to Gogs database without password");
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| SourceError::Connect {
                host: settings.host.clone(),
                source: e,
            })?;
        info!(host = %settings.host, database = %settings.database, "Connected to Gogs database");

        let repo_id = match &settings.repository {
            RepositoryRef::Id(id) => *id,
            RepositoryRef::Name(name) => lookup_repository_id(&pool, name).await?,
        };
        debug!(repo_id, "Resolved Gogs repository");

        Ok(Self { pool, repo_id })
    }
}

async fn lookup_repository_id(pool: &MySqlPool, name: &str) -> Result<i64, SourceError> {
    sqlx::query_scalar::<_, i64>(REPOSITORY_ID_QUERY)
        .bind(name.to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(|e| SourceError::Query {
            what: "repository",
            source: e,
        })?
        .ok_or_else(|| SourceError::RepositoryNotFound {
            name: name.to_string(),
        })
}

fn query_error(what: &'static str) -> impl FnOnce(sqlx::Error) -> SourceError {
    move |source| SourceError::Query { what, source }
}

#[async_trait]
impl SourceReader for GogsDatabase {
    async fn users(&self) -> Result<Vec<SourceUser>, SourceError> {
        let rows = sqlx::query_as::<_, UserRow>(USERS_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("users"))?;
        Ok(rows.into_iter().map(SourceUser::from).collect())
    }

    async fn repository_users(&self) -> Result<Vec<SourceUser>, SourceError> {
        let rows = sqlx::query_as::<_, UserRow>(REPOSITORY_USERS_QUERY)
            .bind(self.repo_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("repository users"))?;
        Ok(rows.into_iter().map(SourceUser::from).collect())
    }

    async fn labels(&self) -> Result<Vec<SourceLabel>, SourceError> {
        let rows = sqlx::query_as::<_, LabelRow>(LABELS_QUERY)
            .bind(self.repo_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("labels"))?;
        Ok(rows
            .into_iter()
            .map(|row| SourceLabel {
                id: row.id,
                name: row.name,
                color: row.color.unwrap_or_default(),
            })
            .collect())
    }

    async fn milestones(&self) -> Result<Vec<SourceMilestone>, SourceError> {
        let rows = sqlx::query_as::<_, MilestoneRow>(MILESTONES_QUERY)
            .bind(self.repo_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("milestones"))?;
        Ok(rows
            .into_iter()
            .map(|row| SourceMilestone {
                id: row.id,
                name: row.name,
                content: row.content.unwrap_or_default(),
                is_closed: row.is_closed != 0,
                deadline_unix: row.deadline_unix,
            })
            .collect())
    }

    async fn issues(&self) -> Result<Vec<IssueRecord>, SourceError> {
        let rows = sqlx::query_as::<_, IssueRow>(ISSUES_QUERY)
            .bind(self.repo_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("issues"))?;
        Ok(rows
            .into_iter()
            .map(|row| IssueRecord {
                id: row.id,
                index: row.issue_index,
                name: row.name,
                content: row.content.unwrap_or_default(),
                milestone_id: row.milestone_id,
                is_closed: row.is_closed != 0,
                is_pull: row.is_pull != 0,
                created_unix: row.created_unix,
                updated_unix: row.updated_unix,
                creator: row.creator,
                assignee: row.assignee,
            })
            .collect())
    }

    async fn pull_requests(&self, issue_id: i64) -> Result<Vec<PullRequestRecord>, SourceError> {
        let rows = sqlx::query_as::<_, PullRequestRow>(PULL_REQUESTS_QUERY)
            .bind(issue_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("pull requests"))?;
        Ok(rows
            .into_iter()
            .map(|row| PullRequestRecord {
                head_branch: row.head_branch.unwrap_or_default(),
                base_branch: row.base_branch.unwrap_or_default(),
                has_merged: row.has_merged != 0,
                merge_base: row.merge_base.unwrap_or_default(),
                merged_commit_id: row.merged_commit_id.unwrap_or_default(),
                merged_unix: row.merged_unix.unwrap_or_default(),
                merger: row.merger,
            })
            .collect())
    }

    async fn comments(&self, issue_id: i64) -> Result<Vec<CommentRecord>, SourceError> {
        let rows = sqlx::query_as::<_, CommentRow>(COMMENTS_QUERY)
            .bind(issue_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("comments"))?;
        Ok(rows
            .into_iter()
            .map(|row| CommentRecord {
                kind: row.kind,
                content: row.content.unwrap_or_default(),
                commit_sha: row.commit_sha,
                created_unix: row.created_unix,
                updated_unix: row.updated_unix,
                author: row.author,
                email: row.email,
            })
            .collect())
    }

    async fn issue_labels(&self, issue_id: i64) -> Result<Vec<String>, SourceError> {
        let names = sqlx::query_scalar::<_, Option<String>>(ISSUE_LABELS_QUERY)
            .bind(issue_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("issue labels"))?;
        Ok(names.into_iter().flatten().collect())
    }
}
