//! Attribution headers for migrated content.
//!
//! Everything migrated is posted by the GitHub App, so each body starts
//! with a small note naming the original author and dates. The notes are
//! Handlebars templates rendered from the structs below.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, TemplateRenderer};

use serde::Serialize;

/// Data of an issue or pull request body.
#[derive(Debug, Clone, Serialize)]
pub struct ItemContent {
    /// "issue" or "pull request".
    pub kind: String,
    pub creator: String,
    pub created: String,
    pub updated: Option<String>,
    pub assignee: Option<String>,
    /// Set when a pull request is migrated as an issue.
    pub branches: Option<Branches>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Branches {
    pub head: String,
    pub base: String,
}

/// Which comment note to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTemplate {
    General,
    StateChange,
    CommitReference,
}

/// Data of a comment note.
#[derive(Debug, Clone, Serialize)]
pub struct CommentContent {
    /// Kind of the commented item.
    pub kind: String,
    pub author: String,
    pub created: String,
    pub updated: Option<String>,
    pub content: String,
    /// New state, for state changes.
    pub state: Option<String>,
    /// Commit sha, for commit references.
    pub commit: Option<String>,
}

/// Data of the note added for a merged pull request.
#[derive(Debug, Clone, Serialize)]
pub struct MergeContent {
    pub head: String,
    pub base: String,
    pub merge_base: String,
    pub merged_commit: String,
    pub author: String,
    pub created: String,
}
