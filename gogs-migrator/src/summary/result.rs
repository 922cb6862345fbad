//! Per-item outcome.

/// What happened to one issue or pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Created as an issue.
    Issue { number: u64 },
    /// Created as a pull request.
    PullRequest { number: u64 },
    /// A pull request created as an issue.
    PullRequestAsIssue { number: u64 },
    /// Excluded by the migration gates.
    Skipped,
    /// Migration was attempted but produced nothing.
    Failed,
}

impl ItemOutcome {
    /// New GitHub number, if the item was migrated.
    #[must_use]
    pub fn number(self) -> Option<u64> {
        match self {
            Self::Issue { number }
            | Self::PullRequest { number }
            | Self::PullRequestAsIssue { number } => Some(number),
            Self::Skipped | Self::Failed => None,
        }
    }
}
