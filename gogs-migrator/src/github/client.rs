//! GitHub client with retry, recovery and dry-run handling.

use crate::github::payloads::{drop_rejected_assignees, number_field};
use crate::github::{
    ApiRequest, FailureDecision, FailureReport, GitHubError, IssueUpdate, NewIssue,
    NewMilestone, NewPullRequest, Operator, RemoteLabel, Transport,
};
use crate::rate_limit::{throttle, wait_for_retry_after, SLOW_MODE_DELAY};
use crate::resolver::UserDirectory;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Issue number returned for every mutating call in dry-run mode.
pub const DRY_RUN_NUMBER: u64 = 42;

const PER_PAGE: usize = 100;

fn dry_run_response() -> Value {
    json!({
        "number": DRY_RUN_NUMBER,
        "id": 1,
        "name": "Example Label",
        "color": "f29513"
    })
}

/// Client behaviour switches.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Answer mutating calls locally instead of sending them.
    pub dry_run: bool,
    /// Pause after each successful mutating call.
    pub slow_mode: bool,
    /// Length of the slow-mode pause.
    pub throttle: Duration,
    /// Whether pull requests may be created at all.
    pub pull_requests_enabled: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            slow_mode: false,
            throttle: SLOW_MODE_DELAY,
            pull_requests_enabled: true,
        }
    }
}

enum Outcome {
    Success(Value),
    Failure { status: Option<u16>, body: Value },
}

/// Client for one target repository.
///
/// Every call that fails without a rate-limit hint is handed to the
/// [`Operator`]. Once the operator picks
/// [`FailureDecision::IgnoreHenceforth`], later failures are skipped
/// without asking.
pub struct GitHubClient {
    transport: Box<dyn Transport>,
    operator: Box<dyn Operator>,
    repo_route: String,
    options: ClientOptions,
    continue_after_error: bool,
    labels: Option<HashMap<String, RemoteLabel>>,
    milestones_by_title: Option<HashMap<String, u64>>,
    users_by_email: HashMap<String, Option<String>>,
}

impl GitHubClient {
    /// Creates a client for `owner/repository`.
    #[must_use]
    pub fn new(
        transport: Box<dyn Transport>,
        operator: Box<dyn Operator>,
        owner: &str,
        repository: &str,
        options: ClientOptions,
    ) -> Self {
        Self {
            transport,
            operator,
            repo_route: format!("/repos/{owner}/{repository}"),
            options,
            continue_after_error: false,
            labels: None,
            milestones_by_title: None,
            users_by_email: HashMap::new(),
        }
    }

    /// Returns true if mutating calls are simulated.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// The operator, for questions asked outside of failure handling.
    pub fn operator(&mut self) -> &mut dyn Operator {
        self.operator.as_mut()
    }

    /// Records a known email to login mapping, skipping the user search.
    pub fn seed_user(&mut self, email: &str, login: &str) {
        self.users_by_email
            .insert(email.trim().to_lowercase(), Some(login.to_string()));
    }

    fn route(&self, path: &str) -> String {
        format!("{}/{}", self.repo_route, path)
    }

    /// Sends one request, waiting out rate limits.
    async fn execute(&mut self, request: &ApiRequest) -> Outcome {
        let mutating = request.method.is_mutating();
        if mutating && self.options.dry_run {
            debug!(method = ?request.method, route = %request.route, "Dry run, request not sent");
            return Outcome::Success(dry_run_response());
        }

        loop {
            match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    if mutating && self.options.slow_mode {
                        throttle(self.options.throttle).await;
                    }
                    return Outcome::Success(response.body);
                }
                Ok(response) => match response.retry_after {
                    Some(secs) => wait_for_retry_after(secs).await,
                    None => {
                        return Outcome::Failure {
                            status: Some(response.status),
                            body: response.body,
                        }
                    }
                },
                Err(e) => {
                    return Outcome::Failure {
                        status: None,
                        body: json!({ "message": e.to_string() }),
                    }
                }
            }
        }
    }

    /// Asks the operator what to do about a failure.
    ///
    /// Returns true if the request should be sent again.
    fn escalate(
        &mut self,
        context: &str,
        status: Option<u16>,
        body: Value,
    ) -> Result<bool, GitHubError> {
        let report = FailureReport::new(context, status, body);
        warn!("{report}");
        if self.continue_after_error {
            return Ok(false);
        }

        match self.operator.on_failure(&report) {
            FailureDecision::Retry => {
                info!(context, "Retrying");
                Ok(true)
            }
            FailureDecision::IgnoreHenceforth => {
                info!("Continuing after errors from now on");
                self.continue_after_error = true;
                Ok(false)
            }
            FailureDecision::ContinueWithoutRetry => Ok(false),
            FailureDecision::Abort => Err(GitHubError::Aborted),
        }
    }

    /// Sends a request until it succeeds or the operator gives up on it.
    async fn request_with_recovery(
        &mut self,
        request: &ApiRequest,
        context: &str,
    ) -> Result<Option<Value>, GitHubError> {
        loop {
            match self.execute(request).await {
                Outcome::Success(body) => return Ok(Some(body)),
                Outcome::Failure { status, body } => {
                    if !self.escalate(context, status, body)? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Fetches every page of a list endpoint.
    async fn get_all(
        &mut self,
        route: &str,
        params: &[(&str, &str)],
        context: &str,
    ) -> Result<Option<Vec<Value>>, GitHubError> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let page_number = page.to_string();
            let per_page = PER_PAGE.to_string();
            let mut query = params.to_vec();
            query.push(("per_page", &per_page));
            query.push(("page", &page_number));

            let request = ApiRequest::get(route).with_query(&query);
            let Some(body) = self.request_with_recovery(&request, context).await? else {
                return Ok(None);
            };

            let batch = match body {
                Value::Array(batch) => batch,
                _ => Vec::new(),
            };
            let count = batch.len();
            items.extend(batch);
            if count < PER_PAGE {
                return Ok(Some(items));
            }
            page += 1;
        }
    }

    /// Creates an issue and returns its number.
    ///
    /// Assignees GitHub rejects are removed and the request is repeated.
    /// Returns `None` when the operator chose to continue without it.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn create_issue(&mut self, issue: &NewIssue) -> Result<Option<u64>, GitHubError> {
        let mut issue = issue.clone();
        let context = format!("Failed to create issue {}", issue.title);
        loop {
            let request = ApiRequest::post(self.route("issues"), serde_json::to_value(&issue)?);
            match self.execute(&request).await {
                Outcome::Success(body) => {
                    let number = number_field(&body, "number");
                    debug!(title = %issue.title, ?number, "Created issue");
                    return Ok(number);
                }
                Outcome::Failure { status, body } => {
                    if drop_rejected_assignees(&mut issue.assignees, &body) {
                        info!(title = %issue.title, "Assignee rejected, retrying without it");
                        continue;
                    }
                    if !self.escalate(&context, status, body)? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Updates an issue, with the same assignee recovery as
    /// [`create_issue`](Self::create_issue).
    ///
    /// Returns the issue number, or `None` if the update was given up.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn update_issue(
        &mut self,
        number: u64,
        update: &IssueUpdate,
    ) -> Result<Option<u64>, GitHubError> {
        let mut update = update.clone();
        let context = format!("Failed to update issue #{number}");
        loop {
            let request = ApiRequest::patch(
                self.route(&format!("issues/{number}")),
                serde_json::to_value(&update)?,
            );
            match self.execute(&request).await {
                Outcome::Success(body) => {
                    debug!(number, "Updated issue");
                    return Ok(number_field(&body, "number").or(Some(number)));
                }
                Outcome::Failure { status, body } => {
                    if drop_rejected_assignees(&mut update.assignees, &body) {
                        info!(number, "Assignee rejected, retrying without it");
                        continue;
                    }
                    if !self.escalate(&context, status, body)? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Adds a comment to an issue and returns the comment id.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn create_issue_comment(
        &mut self,
        number: u64,
        body: &str,
    ) -> Result<Option<u64>, GitHubError> {
        let request = ApiRequest::post(
            self.route(&format!("issues/{number}/comments")),
            json!({ "body": body }),
        );
        let context = format!("Failed to create comment on issue #{number}");
        let response = self.request_with_recovery(&request, &context).await?;
        Ok(response.and_then(|body| number_field(&body, "id")))
    }

    /// Tries to open a pull request and returns its number.
    ///
    /// Failures are expected (deleted branches, identical heads) and are
    /// not escalated; the caller falls back to an issue.
    pub async fn try_create_pull_request(&mut self, pull: &NewPullRequest) -> Option<u64> {
        if !self.options.pull_requests_enabled {
            debug!(title = %pull.title, "Pull request creation disabled");
            return None;
        }
        if pull.head.is_empty() || pull.base.is_empty() {
            debug!(title = %pull.title, "Pull request without branches");
            return None;
        }

        let body = match serde_json::to_value(pull) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize pull request");
                return None;
            }
        };

        match self.execute(&ApiRequest::post(self.route("pulls"), body)).await {
            Outcome::Success(body) => number_field(&body, "number"),
            Outcome::Failure { status, .. } => {
                info!(
                    title = %pull.title,
                    ?status,
                    "Tried creating pull request, but head or base branch seem to be missing"
                );
                None
            }
        }
    }

    /// Creates a milestone unless one with the same title already exists,
    /// and returns its number.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn create_milestone(
        &mut self,
        milestone: &NewMilestone,
    ) -> Result<Option<u64>, GitHubError> {
        if self.milestones_by_title.is_none() {
            let existing = self.load_milestones().await?;
            self.milestones_by_title = Some(existing);
        }
        if let Some(number) = self
            .milestones_by_title
            .as_ref()
            .and_then(|cache| cache.get(&milestone.title))
        {
            debug!(title = %milestone.title, number, "Milestone already exists");
            return Ok(Some(*number));
        }

        let request = ApiRequest::post(self.route("milestones"), serde_json::to_value(milestone)?);
        let context = format!("Failed to create milestone {}", milestone.title);
        let number = self
            .request_with_recovery(&request, &context)
            .await?
            .and_then(|body| number_field(&body, "number"));

        if let (Some(number), Some(cache)) = (number, self.milestones_by_title.as_mut()) {
            cache.insert(milestone.title.clone(), number);
        }
        Ok(number)
    }

    async fn load_milestones(&mut self) -> Result<HashMap<String, u64>, GitHubError> {
        let route = self.route("milestones");
        let items = self
            .get_all(&route, &[("state", "all")], "Could not retrieve milestones")
            .await?
            .unwrap_or_default();

        Ok(items
            .iter()
            .filter_map(|item| {
                let title = item.get("title").and_then(Value::as_str)?;
                Some((title.to_string(), number_field(item, "number")?))
            })
            .collect())
    }

    /// Creates a label unless one with the same name exists.
    ///
    /// `color` may carry a leading `#`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn create_label_if_not_exists(
        &mut self,
        name: &str,
        color: &str,
    ) -> Result<Option<RemoteLabel>, GitHubError> {
        if self.labels.is_none() {
            let route = self.route("labels");
            let existing: HashMap<String, RemoteLabel> = self
                .get_all(&route, &[], "Could not retrieve labels")
                .await?
                .unwrap_or_default()
                .into_iter()
                .filter_map(|item| serde_json::from_value::<RemoteLabel>(item).ok())
                .map(|label| (label.name.clone(), label))
                .collect();
            self.labels = Some(existing);
        }
        if let Some(label) = self.labels.as_ref().and_then(|labels| labels.get(name)) {
            debug!(name, "Label already exists");
            return Ok(Some(label.clone()));
        }

        let request = ApiRequest::post(
            self.route("labels"),
            json!({ "name": name, "color": color.trim_start_matches('#') }),
        );
        let context = format!("Failed to create label {name}");
        let label = self
            .request_with_recovery(&request, &context)
            .await?
            .and_then(|body| serde_json::from_value::<RemoteLabel>(body).ok());

        if let (Some(label), Some(cache)) = (&label, self.labels.as_mut()) {
            cache.insert(name.to_string(), label.clone());
        }
        Ok(label)
    }

    /// Logins of the repository's contributors.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Aborted`] if the operator aborted.
    pub async fn contributors(&mut self) -> Result<Vec<String>, GitHubError> {
        let route = self.route("contributors");
        let items = self
            .get_all(&route, &[], "Could not retrieve contributors")
            .await?
            .unwrap_or_default();

        Ok(items
            .iter()
            .filter_map(|item| item.get("login").and_then(Value::as_str))
            .map(str::to_owned)
            .collect())
    }

    /// Looks up the GitHub login whose public email is `email`.
    ///
    /// Results, including misses, are cached per lowercase email.
    pub async fn find_user_by_email(&mut self, email: &str) -> Option<String> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return None;
        }
        if let Some(cached) = self.users_by_email.get(&email) {
            return cached.clone();
        }

        let login = self.search_user_by_email(&email).await;
        self.users_by_email.insert(email, login.clone());
        login
    }

    async fn search_user_by_email(&mut self, email: &str) -> Option<String> {
        let query = format!("{email} in:email");
        let request = ApiRequest::get("/search/users").with_query(&[("q", query.as_str())]);
        let Outcome::Success(body) = self.execute(&request).await else {
            debug!(email, "User search failed");
            return None;
        };

        let logins: Vec<String> = body
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("login").and_then(Value::as_str))
            .map(str::to_owned)
            .collect();

        for login in logins {
            let request = ApiRequest::get(format!("/users/{login}"));
            if let Outcome::Success(profile) = self.execute(&request).await {
                let public = profile.get("email").and_then(Value::as_str);
                if public.is_some_and(|public| public.eq_ignore_ascii_case(email)) {
                    debug!(email, login = %login, "Found GitHub user by email");
                    return Some(login);
                }
            }
        }
        None
    }
}

#[async_trait]
impl UserDirectory for GitHubClient {
    async fn find_user_by_email(&mut self, email: &str) -> Option<String> {
        GitHubClient::find_user_by_email(self, email).await
    }
}
