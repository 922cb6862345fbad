//! Run summary types.

use super::result::ItemOutcome;

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of labels created or found.
    pub labels_migrated: usize,

    /// Number of milestones created or found.
    pub milestones_migrated: usize,

    /// Number of issues created.
    pub issues_created: usize,

    /// Number of pull requests created as pull requests.
    pub pull_requests_created: usize,

    /// Number of pull requests created as issues.
    pub pull_requests_as_issues: usize,

    /// Number of items excluded by configuration.
    pub items_skipped: usize,

    /// Number of items that could not be migrated.
    pub items_failed: usize,

    /// Number of comments created.
    pub comments_created: usize,

    /// Number of comments that could not be created.
    pub comments_failed: usize,

    /// Number of replayed reopen/close events.
    pub state_changes: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with an item outcome.
    pub fn record_result(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Issue { .. } => self.issues_created += 1,
            ItemOutcome::PullRequest { .. } => self.pull_requests_created += 1,
            ItemOutcome::PullRequestAsIssue { .. } => self.pull_requests_as_issues += 1,
            ItemOutcome::Skipped => self.items_skipped += 1,
            ItemOutcome::Failed => self.items_failed += 1,
        }
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.items_failed > 0 || self.comments_failed > 0
    }

    /// Returns true if all operations were successful.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_record_result() {
        let mut summary = RunSummary::new(false);

        summary.record_result(ItemOutcome::Issue { number: 1 });
        summary.record_result(ItemOutcome::PullRequestAsIssue { number: 2 });
        summary.record_result(ItemOutcome::Skipped);

        assert_eq!(summary.issues_created, 1);
        assert_eq!(summary.pull_requests_as_issues, 1);
        assert_eq!(summary.items_skipped, 1);
        assert!(summary.all_success());

        summary.record_result(ItemOutcome::Failed);
        assert!(summary.has_failures());
    }
}
