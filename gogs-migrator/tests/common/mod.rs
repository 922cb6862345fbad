#![allow(dead_code)]

use async_trait::async_trait;
use gogs_migrator::github::{ApiRequest, ApiResponse, Method};
use gogs_migrator::source::{
    CommentRecord, IssueRecord, PullRequestRecord, SourceError, SourceLabel, SourceMilestone,
    SourceReader, SourceUser,
};
use gogs_migrator::{FailureDecision, FailureReport, GitHubError, Operator, Transport};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const CREATED: i64 = 1_456_833_600;

pub type RequestLog = Arc<Mutex<Vec<ApiRequest>>>;

/// In-memory stand-in for the GitHub API.
///
/// Issue and pull request numbers are handed out from 101 upwards.
pub struct FakeGitHub {
    state: Mutex<FakeState>,
    log: RequestLog,
}

struct FakeState {
    next_number: u64,
    next_id: u64,
    fail_pull_requests: bool,
    rejected_assignee: Option<String>,
    users: HashMap<String, String>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_number: 101,
                next_id: 1000,
                fail_pull_requests: false,
                rejected_assignee: None,
                users: HashMap::new(),
            }),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Rejects every pull request, as if the branches were missing.
    pub fn failing_pull_requests(self) -> Self {
        self.state.lock().unwrap().fail_pull_requests = true;
        self
    }

    /// Fails issue creation and updates that assign `login`, the way GitHub
    /// answers for users who cannot be assigned.
    pub fn rejecting_assignee(self, login: &str) -> Self {
        self.state.lock().unwrap().rejected_assignee = Some(login.to_string());
        self
    }

    /// Registers a GitHub account with a public email.
    pub fn with_user(self, email: &str, login: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(email.to_string(), login.to_string());
        self
    }

    pub fn log(&self) -> RequestLog {
        Arc::clone(&self.log)
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        let path = request.route.split('?').next().unwrap_or_default();
        let body = request.body.clone().unwrap_or(Value::Null);

        if let Some(login) = &state.rejected_assignee {
            let assigned = body
                .get("assignees")
                .and_then(Value::as_array)
                .is_some_and(|assignees| assignees.iter().any(|a| a.as_str() == Some(login.as_str())));
            if assigned {
                return ApiResponse::new(
                    422,
                    json!({
                        "message": "Validation Failed",
                        "errors": [{"resource": "Issue", "field": "assignees", "code": "invalid", "value": login}]
                    }),
                );
            }
        }

        match (request.method, path) {
            (Method::Get, "/search/users") => {
                let items: Vec<Value> = state
                    .users
                    .iter()
                    .filter(|(email, _)| request.route.contains(&email.replace('@', "%40")))
                    .map(|(_, login)| json!({ "login": login }))
                    .collect();
                ApiResponse::new(200, json!({ "items": items }))
            }
            (Method::Get, path) if path.starts_with("/users/") => {
                let login = &path["/users/".len()..];
                let email = state
                    .users
                    .iter()
                    .find(|(_, l)| l.as_str() == login)
                    .map(|(email, _)| email.clone());
                ApiResponse::new(200, json!({ "login": login, "email": email }))
            }
            (Method::Get, _) => ApiResponse::new(200, json!([])),
            (Method::Post, path) if path.ends_with("/pulls") => {
                if state.fail_pull_requests {
                    ApiResponse::new(422, json!({ "message": "Validation Failed" }))
                } else {
                    let number = state.next_number;
                    state.next_number += 1;
                    ApiResponse::new(201, json!({ "number": number }))
                }
            }
            (Method::Post, path) if path.ends_with("/issues") => {
                let number = state.next_number;
                state.next_number += 1;
                ApiResponse::new(201, json!({ "number": number }))
            }
            (Method::Post, path) if path.ends_with("/comments") => {
                let id = state.next_id;
                state.next_id += 1;
                ApiResponse::new(201, json!({ "id": id }))
            }
            (Method::Post, path) if path.ends_with("/milestones") => {
                let number = state.next_id;
                state.next_id += 1;
                ApiResponse::new(201, json!({ "number": number }))
            }
            (Method::Post, _) => ApiResponse::new(201, body),
            (Method::Patch, path) => {
                let number: u64 = path.rsplit('/').next().and_then(|n| n.parse().ok()).unwrap_or(0);
                ApiResponse::new(200, json!({ "number": number }))
            }
        }
    }
}

#[async_trait]
impl Transport for FakeGitHub {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, GitHubError> {
        self.log.lock().unwrap().push(request.clone());
        Ok(self.respond(request))
    }
}

/// Operator with canned answers.
#[derive(Default)]
pub struct CannedOperator {
    pub decisions: VecDeque<FailureDecision>,
    pub confirm: bool,
}

impl CannedOperator {
    pub fn confirming() -> Self {
        Self {
            confirm: true,
            ..Self::default()
        }
    }
}

impl Operator for CannedOperator {
    fn on_failure(&mut self, _report: &FailureReport) -> FailureDecision {
        self.decisions
            .pop_front()
            .unwrap_or(FailureDecision::ContinueWithoutRetry)
    }

    fn confirm(&mut self, _question: &str) -> bool {
        self.confirm
    }
}

/// In-memory Gogs repository.
#[derive(Default)]
pub struct MemorySource {
    pub users: Vec<SourceUser>,
    pub labels: Vec<SourceLabel>,
    pub milestones: Vec<SourceMilestone>,
    pub issues: Vec<IssueRecord>,
    pub pull_requests: HashMap<i64, Vec<PullRequestRecord>>,
    pub comments: HashMap<i64, Vec<CommentRecord>>,
    pub issue_labels: HashMap<i64, Vec<String>>,
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn users(&self) -> Result<Vec<SourceUser>, SourceError> {
        Ok(self.users.clone())
    }

    async fn repository_users(&self) -> Result<Vec<SourceUser>, SourceError> {
        Ok(self.users.clone())
    }

    async fn labels(&self) -> Result<Vec<SourceLabel>, SourceError> {
        Ok(self.labels.clone())
    }

    async fn milestones(&self) -> Result<Vec<SourceMilestone>, SourceError> {
        Ok(self.milestones.clone())
    }

    async fn issues(&self) -> Result<Vec<IssueRecord>, SourceError> {
        Ok(self.issues.clone())
    }

    async fn pull_requests(&self, issue_id: i64) -> Result<Vec<PullRequestRecord>, SourceError> {
        Ok(self.pull_requests.get(&issue_id).cloned().unwrap_or_default())
    }

    async fn comments(&self, issue_id: i64) -> Result<Vec<CommentRecord>, SourceError> {
        Ok(self.comments.get(&issue_id).cloned().unwrap_or_default())
    }

    async fn issue_labels(&self, issue_id: i64) -> Result<Vec<String>, SourceError> {
        Ok(self.issue_labels.get(&issue_id).cloned().unwrap_or_default())
    }
}

pub fn user(name: &str, email: &str) -> SourceUser {
    SourceUser {
        id: 1,
        name: name.to_string(),
        full_name: String::new(),
        email: email.to_string(),
    }
}

/// Issue row with database id `index + 100`.
pub fn issue(index: i64, title: &str, content: &str) -> IssueRecord {
    IssueRecord {
        id: index + 100,
        index,
        name: title.to_string(),
        content: content.to_string(),
        milestone_id: 0,
        is_closed: false,
        is_pull: false,
        created_unix: CREATED + index,
        updated_unix: CREATED + index,
        creator: Some("ada".to_string()),
        assignee: None,
    }
}

pub fn pull_request(head: &str, base: &str) -> PullRequestRecord {
    PullRequestRecord {
        head_branch: head.to_string(),
        base_branch: base.to_string(),
        has_merged: false,
        merge_base: String::new(),
        merged_commit_id: String::new(),
        merged_unix: 0,
        merger: None,
    }
}

pub fn comment(kind: i64, content: &str, created_unix: i64) -> CommentRecord {
    CommentRecord {
        kind,
        content: content.to_string(),
        commit_sha: None,
        created_unix,
        updated_unix: created_unix,
        author: Some("bob".to_string()),
        email: Some("bob@example.com".to_string()),
    }
}

/// Requests that would change something on GitHub.
pub fn mutations(log: &RequestLog) -> Vec<ApiRequest> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|request| request.method.is_mutating())
        .cloned()
        .collect()
}
