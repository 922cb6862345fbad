//! Per-state migration gates.
//!
//! Every migratable property is switched on or off separately for open and
//! closed source items, e.g. `assignees = ["open"]` only assigns items that
//! are still open in Gogs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Open/closed state of a source issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Item is open.
    Open,
    /// Item is closed.
    Closed,
}

impl ItemState {
    /// Maps the Gogs `is_closed` flag to a state.
    #[must_use]
    pub fn from_closed(is_closed: bool) -> Self {
        if is_closed {
            Self::Closed
        } else {
            Self::Open
        }
    }

    /// Returns the state as used by the GitHub API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property that can be gated by state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Whether the item itself is migrated.
    Migrate,
    /// Whether the milestone is set on the migrated item.
    Milestones,
    /// Whether the assignee is set on the migrated item.
    Assignees,
}

/// Property path within the `[migration]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePath {
    /// `migration.issues.<property>`
    Issues(Property),
    /// `migration.pull_requests.<property>`
    PullRequests(Property),
    /// `migration.pull_requests.as_issue.<property>`
    PullRequestsAsIssue(Property),
}

impl fmt::Display for GatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (group, property) = match self {
            Self::Issues(p) => ("issues", p),
            Self::PullRequests(p) => ("pull_requests", p),
            Self::PullRequestsAsIssue(p) => ("pull_requests.as_issue", p),
        };
        let property = match property {
            Property::Migrate => "migrate",
            Property::Milestones => "milestones",
            Property::Assignees => "assignees",
        };
        write!(f, "migration.{group}.{property}")
    }
}

/// The states for which each property is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertyGates {
    #[serde(default)]
    pub migrate: Vec<ItemState>,
    #[serde(default)]
    pub milestones: Vec<ItemState>,
    #[serde(default)]
    pub assignees: Vec<ItemState>,
}

impl PropertyGates {
    /// Returns the states configured for a property.
    #[must_use]
    pub fn states(&self, property: Property) -> &[ItemState] {
        match property {
            Property::Migrate => &self.migrate,
            Property::Milestones => &self.milestones,
            Property::Assignees => &self.assignees,
        }
    }

    /// Returns true if the property is enabled for `state`.
    #[must_use]
    pub fn allows(&self, property: Property, state: ItemState) -> bool {
        self.states(property).contains(&state)
    }
}

/// Gates for pull requests, including the fallback used when a pull request
/// has to be created as a plain issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestGates {
    #[serde(flatten)]
    pub gates: PropertyGates,

    #[serde(default)]
    pub as_issue: PropertyGates,
}
