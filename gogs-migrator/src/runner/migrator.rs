//! Phase-by-phase migration of one repository.

use crate::config::{GatePath, ItemState, MigrationSettings, Property};
use crate::github::{GitHubClient, IssueUpdate, NewIssue, NewMilestone, NewPullRequest};
use crate::model::{ContentContext, MigratableItem};
use crate::resolver::{read_accounts_file, IdentityMap, IssueMap, ReferenceResolver};
use crate::runner::MigrationError;
use crate::source::SourceReader;
use crate::summary::{ItemOutcome, RunSummary};
use crate::templates::TemplateRenderer;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, info_span, warn, Instrument};

/// Title prefix of pull requests created as issues.
const PULL_REQUEST_PREFIX: &str = "[PULL REQUEST] ";

/// Migrates one Gogs repository into one GitHub repository.
///
/// Phases run in order: user check, labels, milestones, issues and pull
/// requests, comments. Later phases use the maps filled by earlier ones.
pub struct Migrator<S: SourceReader> {
    source: S,
    client: GitHubClient,
    settings: MigrationSettings,
    renderer: TemplateRenderer,
    resolver: ReferenceResolver,
    identities: IdentityMap,
    issue_map: IssueMap,
    milestone_map: HashMap<i64, u64>,
    items: Vec<MigratableItem>,
    summary: RunSummary,
}

impl<S: SourceReader> Migrator<S> {
    /// Creates a migrator.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Template`] if the templates fail to compile.
    pub fn new(
        source: S,
        client: GitHubClient,
        settings: MigrationSettings,
    ) -> Result<Self, MigrationError> {
        let resolver =
            ReferenceResolver::new(settings.mentions, settings.default_code_language.clone());
        let summary = RunSummary::new(client.is_dry_run());
        Ok(Self {
            source,
            client,
            settings,
            renderer: TemplateRenderer::new()?,
            resolver,
            identities: IdentityMap::default(),
            issue_map: IssueMap::new(),
            milestone_map: HashMap::new(),
            items: Vec::new(),
            summary,
        })
    }

    /// Old issue index to new number, as filled so far.
    #[must_use]
    pub fn issue_map(&self) -> &IssueMap {
        &self.issue_map
    }

    /// Old milestone id to new milestone number.
    #[must_use]
    pub fn milestone_map(&self) -> &HashMap<i64, u64> {
        &self.milestone_map
    }

    /// Runs every enabled phase.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] if the source cannot be read, content
    /// cannot be rendered, or the operator aborts.
    pub async fn run(&mut self) -> Result<RunSummary, MigrationError> {
        if self.client.is_dry_run() {
            info!("Dry run, not making changes on GitHub");
        }

        self.load_identities().await?;

        if self.settings.check_users {
            self.check_users()
                .instrument(info_span!("check_users"))
                .await?;
        }

        if self.settings.labels {
            info!("Migrating labels");
            self.migrate_labels()
                .instrument(info_span!("labels"))
                .await?;
        } else {
            info!("Skipping labels");
        }

        if self.settings.migrate_milestones() {
            info!("Migrating milestones");
            self.migrate_milestones()
                .instrument(info_span!("milestones"))
                .await?;
        } else {
            info!("Skipping milestones");
        }

        if self.settings.migrate_issues() || self.settings.migrate_pull_requests() {
            info!("Migrating issues and pull requests");
            self.migrate_items()
                .instrument(info_span!("issues"))
                .await?;

            info!("Migrating comments");
            self.migrate_comments()
                .instrument(info_span!("comments"))
                .await?;
        } else {
            info!("Skipping issues and pull requests");
        }

        Ok(self.summary.clone())
    }

    async fn load_identities(&mut self) -> Result<(), MigrationError> {
        let users = self.source.users().await?;
        self.identities = IdentityMap::new(&users);

        let accounts = read_accounts_file(&self.settings.accounts_file)?;
        for (name, login) in &accounts {
            self.identities.add_override(name, login);
            match self.identities.email_for(name) {
                Some(email) => self.client.seed_user(email, login),
                None => debug!(name = %name, "Mapped account is not a Gogs user"),
            }
        }
        debug!(
            users = users.len(),
            overrides = accounts.len(),
            "Loaded user identities"
        );
        Ok(())
    }

    async fn check_users(&mut self) -> Result<(), MigrationError> {
        let users = self.source.repository_users().await?;
        let mut missing = Vec::new();
        let mut mapped = Vec::new();
        for user in &users {
            match self.identities.resolve(&user.name, &mut self.client).await {
                Some(login) => mapped.push(login),
                None => missing.push(user),
            }
        }

        if !mapped.is_empty() {
            let contributors: HashSet<String> = self
                .client
                .contributors()
                .await?
                .into_iter()
                .map(|login| login.to_lowercase())
                .collect();
            for login in mapped
                .iter()
                .filter(|login| !contributors.contains(&login.to_lowercase()))
            {
                debug!(login = %login, "Not a contributor of the target repository, assigning may fail");
            }
        }

        if missing.is_empty() {
            info!(users = users.len(), "All Gogs users have a GitHub account");
            return Ok(());
        }

        info!("No GitHub accounts were found for the following Gogs users:");
        for user in &missing {
            info!("\t{} ({}, {})", user.name, user.full_name, user.email);
        }
        info!(
            accounts_file = %self.settings.accounts_file.display(),
            "Gogs users can be mapped manually with one `gogs-username github-username` line per user"
        );

        if self
            .client
            .operator()
            .confirm("Do you want to continue without these users?")
        {
            Ok(())
        } else {
            Err(MigrationError::Aborted)
        }
    }

    async fn migrate_labels(&mut self) -> Result<(), MigrationError> {
        for label in self.source.labels().await? {
            if self
                .client
                .create_label_if_not_exists(&label.name, &label.color)
                .await?
                .is_some()
            {
                self.summary.labels_migrated += 1;
            }
        }
        info!(count = self.summary.labels_migrated, "Finished migrating labels");
        Ok(())
    }

    async fn migrate_milestones(&mut self) -> Result<(), MigrationError> {
        for milestone in self.source.milestones().await? {
            let request = NewMilestone {
                title: milestone.name.clone(),
                state: milestone.state().as_str().to_string(),
                description: milestone.content.clone(),
                due_on: milestone.due_on(),
            };
            match self.client.create_milestone(&request).await? {
                Some(number) => {
                    debug!(id = milestone.id, number, "Milestone migrated");
                    self.milestone_map.insert(milestone.id, number);
                    self.summary.milestones_migrated += 1;
                }
                None => warn!(title = %milestone.name, "Milestone not migrated"),
            }
        }
        info!(count = self.summary.milestones_migrated, "Finished migrating milestones");
        Ok(())
    }

    async fn migrate_items(&mut self) -> Result<(), MigrationError> {
        let mut items = Vec::new();
        for record in self.source.issues().await? {
            items.push(MigratableItem::load(record, &self.source).await?);
        }
        info!(count = items.len(), "Loaded issues and pull requests");

        for item in &items {
            if self.issue_map.contains(item.index()) {
                debug!(index = item.index(), "Already processed, skipping");
                continue;
            }

            let span = info_span!("item", index = item.index(), kind = item.kind());
            let outcome = self.migrate_item(item).instrument(span).await?;
            self.issue_map.record(item.index(), outcome.number());
            self.summary.record_result(outcome);
        }

        self.items = items;
        Ok(())
    }

    async fn migrate_item(&mut self, item: &MigratableItem) -> Result<ItemOutcome, MigrationError> {
        let state = item.state();

        if !item.is_pull() {
            if !self.settings.allows(GatePath::Issues(Property::Migrate), state) {
                debug!(title = %item.title(), "Issue not migrated in this state");
                return Ok(ItemOutcome::Skipped);
            }
            let outcome = match self.create_as_issue(item).await? {
                Some(number) => ItemOutcome::Issue { number },
                None => ItemOutcome::Failed,
            };
            info!(?outcome, "Issue migrated");
            return Ok(outcome);
        }

        if !self
            .settings
            .allows(GatePath::PullRequests(Property::Migrate), state)
        {
            debug!(title = %item.title(), "Pull request not migrated in this state");
            return Ok(ItemOutcome::Skipped);
        }

        if let Some(number) = self.create_as_pull_request(item).await? {
            info!(number, "Pull request migrated");
            return Ok(ItemOutcome::PullRequest { number });
        }

        if !self
            .settings
            .allows(GatePath::PullRequestsAsIssue(Property::Migrate), state)
        {
            debug!(title = %item.title(), "Pull request could not be created, no issue fallback");
            return Ok(ItemOutcome::Failed);
        }

        debug!("Migrating pull request as issue");
        let outcome = match self.create_as_issue(item).await? {
            Some(number) => ItemOutcome::PullRequestAsIssue { number },
            None => ItemOutcome::Failed,
        };
        info!(?outcome, "Pull request migrated as issue");
        Ok(outcome)
    }

    /// Milestone number for an item, if the gate at `gate` allows it.
    fn milestone_for(&self, item: &MigratableItem, gate: GatePath) -> Option<u64> {
        if !self.settings.migrate_milestones() || !self.settings.allows(gate, item.state()) {
            return None;
        }
        let id = item.milestone_id()?;
        let number = self.milestone_map.get(&id).copied();
        if number.is_none() {
            debug!(milestone_id = id, "Milestone was not migrated");
        }
        number
    }

    async fn labels_for(&self, item: &MigratableItem) -> Result<Option<Vec<String>>, MigrationError> {
        if !self.settings.labels {
            return Ok(None);
        }
        let labels = self.source.issue_labels(item.issue().id).await?;
        Ok(Some(labels).filter(|labels| !labels.is_empty()))
    }

    async fn assignees_for(&mut self, item: &MigratableItem, gate: GatePath) -> Option<Vec<String>> {
        if !self.settings.allows(gate, item.state()) {
            return None;
        }
        item.assignee_login(&self.identities, &mut self.client)
            .await
            .map(|login| vec![login])
    }

    async fn create_as_pull_request(
        &mut self,
        item: &MigratableItem,
    ) -> Result<Option<u64>, MigrationError> {
        let Some((head, base)) = item.head_base() else {
            return Ok(None);
        };

        let cx = ContentContext {
            renderer: &self.renderer,
            resolver: &self.resolver,
            identities: &self.identities,
            issue_map: &self.issue_map,
        };
        let body = item.pull_request_content(&cx, &mut self.client).await?;
        let pull = NewPullRequest {
            title: item.title().to_string(),
            body,
            head: head.to_string(),
            base: base.to_string(),
        };
        let Some(number) = self.client.try_create_pull_request(&pull).await else {
            return Ok(None);
        };

        // Labels, assignees and milestone cannot be set when opening a pull request.
        let update = IssueUpdate {
            state: None,
            labels: self.labels_for(item).await?,
            assignees: self
                .assignees_for(item, GatePath::PullRequests(Property::Assignees))
                .await,
            milestone: self.milestone_for(item, GatePath::PullRequests(Property::Milestones)),
        };
        if !update.is_empty() {
            debug!(number, ?update, "Setting pull request properties");
            self.client.update_issue(number, &update).await?;
        }
        Ok(Some(number))
    }

    async fn create_as_issue(&mut self, item: &MigratableItem) -> Result<Option<u64>, MigrationError> {
        let title = if item.is_pull() {
            format!("{PULL_REQUEST_PREFIX}{}", item.title())
        } else {
            item.title().to_string()
        };

        let milestone = self.milestone_for(
            item,
            MigrationSettings::issue_gate(item.is_pull(), Property::Milestones),
        );
        let labels = self.labels_for(item).await?;
        let assignees = self
            .assignees_for(
                item,
                MigrationSettings::issue_gate(item.is_pull(), Property::Assignees),
            )
            .await;

        let cx = ContentContext {
            renderer: &self.renderer,
            resolver: &self.resolver,
            identities: &self.identities,
            issue_map: &self.issue_map,
        };
        let body = item.issue_content(&cx, &mut self.client).await?;

        let issue = NewIssue {
            title,
            body,
            labels,
            assignees,
            milestone,
        };
        Ok(self.client.create_issue(&issue).await?)
    }

    async fn migrate_comments(&mut self) -> Result<(), MigrationError> {
        let items = std::mem::take(&mut self.items);
        for item in &items {
            let Some(number) = self.issue_map.migrated(item.index()) else {
                debug!(index = item.index(), "Not migrated, skipping comments");
                continue;
            };

            let span = info_span!("comments", index = item.index(), number);
            self.migrate_item_comments(item, number)
                .instrument(span)
                .await?;
        }
        self.items = items;
        Ok(())
    }

    async fn migrate_item_comments(
        &mut self,
        item: &MigratableItem,
        number: u64,
    ) -> Result<(), MigrationError> {
        let comments = item.load_comments(&self.source).await?;
        debug!(count = comments.len(), "Loaded comments");

        let mut state = ItemState::Open;
        for comment in &comments {
            let cx = ContentContext {
                renderer: &self.renderer,
                resolver: &self.resolver,
                identities: &self.identities,
                issue_map: &self.issue_map,
            };
            let body = comment.render(item.kind(), &cx, &mut self.client).await?;
            match self.client.create_issue_comment(number, &body).await? {
                Some(_) => self.summary.comments_created += 1,
                None => self.summary.comments_failed += 1,
            }

            if let Some(new_state) = comment.state_change() {
                debug!(state = %new_state, "Replaying state change");
                self.client
                    .update_issue(number, &IssueUpdate::state(new_state.as_str()))
                    .await?;
                self.summary.state_changes += 1;
                state = new_state;
            }
        }

        if item.state() == ItemState::Closed && state != ItemState::Closed {
            debug!("Closing item without a close event");
            self.client
                .update_issue(number, &IssueUpdate::state(ItemState::Closed.as_str()))
                .await?;
        }
        Ok(())
    }
}
