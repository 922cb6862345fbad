mod common;

use common::{comment, issue, mutations, pull_request, user, CannedOperator, FakeGitHub, MemorySource};
use gogs_migrator::github::Method;
use gogs_migrator::source::SourceMilestone;
use gogs_migrator::{
    ClientOptions, GitHubClient, MigrationError, MigrationSettings, Migrator, Operator, Settings,
};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

const BASE: &str = r#"
[gogs]
host = "localhost"
database = "gogs"
username = "gogs"
repository = "website"

[github]
username = "acme"
repository = "website"
token = "ghp_test"
"#;

fn settings(migration: &str) -> MigrationSettings {
    Settings::from_toml_str(&format!("{BASE}\n{migration}"), "test")
        .unwrap()
        .migration
}

fn client(github: FakeGitHub, operator: impl Operator + 'static, dry_run: bool) -> GitHubClient {
    GitHubClient::new(
        Box::new(github),
        Box::new(operator),
        "acme",
        "website",
        ClientOptions {
            dry_run,
            ..ClientOptions::default()
        },
    )
}

fn body_of(request: &gogs_migrator::github::ApiRequest, field: &str) -> Value {
    request
        .body
        .as_ref()
        .and_then(|body| body.get(field))
        .cloned()
        .unwrap_or(Value::Null)
}

const EVERYTHING: &str = r#"
[migration]
dryrun = false
check_users = false
accounts_file = "does-not-exist"

[migration.issues]
migrate = ["open", "closed"]

[migration.pull_requests]
migrate = ["open", "closed"]

[migration.pull_requests.as_issue]
migrate = ["open", "closed"]
"#;

#[tokio::test]
async fn failed_pull_request_falls_back_to_issue() {
    let mut pr = issue(2, "Add feature", "Adds it");
    pr.is_pull = true;
    let source = MemorySource {
        users: vec![user("ada", "")],
        issues: vec![issue(1, "Crash", "It crashes"), pr],
        pull_requests: [(102, vec![pull_request("feature", "master")])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new().failing_pull_requests();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(EVERYTHING),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(migrator.issue_map().get(1), Some(Some(101)));
    assert_eq!(migrator.issue_map().get(2), Some(Some(102)));
    assert_eq!(summary.issues_created, 1);
    assert_eq!(summary.pull_requests_as_issues, 1);

    let requests = mutations(&log);
    let routes: Vec<&str> = requests.iter().map(|r| r.route.as_str()).collect();
    assert_eq!(
        routes,
        vec![
            "/repos/acme/website/issues",
            "/repos/acme/website/pulls",
            "/repos/acme/website/issues",
        ]
    );
    assert_eq!(body_of(&requests[2], "title"), json!("[PULL REQUEST] Add feature"));
    let body = body_of(&requests[2], "body");
    assert!(body
        .as_str()
        .unwrap()
        .starts_with("<sub>This issue was originally a pull request from branch `feature` to branch `master`\n"));
}

#[tokio::test]
async fn created_pull_request_gets_labels_afterwards() {
    let mut pr = issue(1, "Add feature", "Adds it");
    pr.is_pull = true;
    let mut plain = issue(2, "Unlabelled", "");
    plain.is_pull = true;
    let source = MemorySource {
        issues: vec![pr, plain],
        pull_requests: [
            (101, vec![pull_request("feature", "master")]),
            (102, vec![pull_request("fix", "master")]),
        ]
        .into(),
        issue_labels: [(101, vec!["enhancement".to_string()])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(&EVERYTHING.replace("dryrun = false", "dryrun = false\nlabels = true")),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(summary.pull_requests_created, 2);
    let patches: Vec<_> = mutations(&log)
        .into_iter()
        .filter(|r| r.method == Method::Patch)
        .collect();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].route, "/repos/acme/website/issues/101");
    assert_eq!(patches[0].body, Some(json!({"labels": ["enhancement"]})));
}

#[tokio::test]
async fn pull_request_gate_decides_before_issue_fallback() {
    let mut pr = issue(5, "Old feature", "");
    pr.is_pull = true;
    pr.is_closed = true;
    let source = MemorySource {
        issues: vec![pr],
        pull_requests: [(105, vec![pull_request("old", "master")])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
check_users = false

[migration.pull_requests]
migrate = ["open"]

[migration.pull_requests.as_issue]
migrate = ["closed"]
"#,
        ),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(migrator.issue_map().get(5), Some(None));
    assert_eq!(summary.items_skipped, 1);
    assert!(mutations(&log).is_empty());
}

#[tokio::test]
async fn failed_pull_request_without_issue_fallback_is_not_migrated() {
    let mut pr = issue(1, "Old feature", "");
    pr.is_pull = true;
    pr.is_closed = true;
    let source = MemorySource {
        issues: vec![pr],
        pull_requests: [(101, vec![pull_request("old", "master")])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new().failing_pull_requests();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
check_users = false

[migration.pull_requests]
migrate = ["open", "closed"]

[migration.pull_requests.as_issue]
migrate = ["open"]
"#,
        ),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(migrator.issue_map().get(1), Some(None));
    assert_eq!(summary.items_failed, 1);
    let routes: Vec<String> = mutations(&log).into_iter().map(|r| r.route).collect();
    assert_eq!(routes, vec!["/repos/acme/website/pulls".to_string()]);
}

#[tokio::test]
async fn rejected_assignee_is_dropped_from_pull_request_update() {
    let mut pr = issue(1, "Add feature", "");
    pr.is_pull = true;
    pr.assignee = Some("bob".to_string());
    let source = MemorySource {
        users: vec![user("bob", "bob@example.com")],
        issues: vec![pr],
        pull_requests: [(101, vec![pull_request("feature", "master")])].into(),
        issue_labels: [(101, vec!["bug".to_string()])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new()
        .with_user("bob@example.com", "bob-gh")
        .rejecting_assignee("bob-gh");
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
check_users = false
labels = true

[migration.pull_requests]
migrate = ["open"]
assignees = ["open"]
"#,
        ),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(summary.pull_requests_created, 1);
    let patches: Vec<Option<Value>> = mutations(&log)
        .into_iter()
        .filter(|r| r.method == Method::Patch)
        .map(|r| r.body)
        .collect();
    assert_eq!(
        patches,
        vec![
            Some(json!({"labels": ["bug"], "assignees": ["bob-gh"]})),
            Some(json!({"labels": ["bug"], "assignees": []})),
        ]
    );
}

#[tokio::test]
async fn milestones_are_created_and_assigned() {
    let mut planned = issue(1, "Plan release", "");
    planned.milestone_id = 7;
    let source = MemorySource {
        milestones: vec![SourceMilestone {
            id: 7,
            name: "v1.0".to_string(),
            content: "First release".to_string(),
            is_closed: false,
            deadline_unix: 0,
        }],
        issues: vec![planned],
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
check_users = false

[migration.issues]
migrate = ["open"]
milestones = ["open"]
"#,
        ),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(summary.milestones_migrated, 1);
    assert_eq!(migrator.milestone_map().get(&7), Some(&1000));
    let requests = mutations(&log);
    assert_eq!(requests[0].route, "/repos/acme/website/milestones");
    assert_eq!(body_of(&requests[0], "title"), json!("v1.0"));
    assert_eq!(body_of(&requests[1], "milestone"), json!(1000));
}

#[tokio::test]
async fn reopen_then_close_ends_closed() {
    let mut closed = issue(1, "Flaky", "");
    closed.is_closed = true;
    let source = MemorySource {
        issues: vec![closed],
        comments: [(
            101,
            vec![
                comment(2, "", common::CREATED + 30),
                comment(1, "", common::CREATED + 20),
                comment(0, "Still broken", common::CREATED + 10),
            ],
        )]
        .into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(EVERYTHING),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(summary.comments_created, 3);
    assert_eq!(summary.state_changes, 2);

    let states: Vec<Value> = mutations(&log)
        .iter()
        .filter(|r| r.method == Method::Patch)
        .map(|r| body_of(r, "state"))
        .collect();
    assert_eq!(states, vec![json!("open"), json!("closed")]);

    let comments: Vec<Value> = mutations(&log)
        .iter()
        .filter(|r| r.route.ends_with("/comments"))
        .map(|r| body_of(r, "body"))
        .collect();
    assert!(comments[0].as_str().unwrap().ends_with("Still broken"));
    assert!(comments[1].as_str().unwrap().contains("originally reopened by **bob**"));
    assert!(comments[2].as_str().unwrap().contains("originally closed by **bob**"));
}

#[tokio::test]
async fn closed_item_without_close_event_is_closed() {
    let mut closed = issue(1, "Imported", "");
    closed.is_closed = true;
    let source = MemorySource {
        issues: vec![closed],
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(EVERYTHING),
    )
    .unwrap();
    migrator.run().await.unwrap();

    let patches: Vec<_> = mutations(&log)
        .into_iter()
        .filter(|r| r.method == Method::Patch)
        .collect();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].body, Some(json!({"state": "closed"})));
}

#[tokio::test]
async fn references_follow_the_issue_map() {
    let mut skipped = issue(3, "Old", "");
    skipped.is_closed = true;
    let source = MemorySource {
        issues: vec![
            issue(1, "First", ""),
            issue(2, "Second", "see #1 and #3"),
            skipped,
        ],
        comments: [(102, vec![comment(0, "dup of #3, related to #1", common::CREATED + 50)])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
check_users = false

[migration.issues]
migrate = ["open"]
"#,
        ),
    )
    .unwrap();
    migrator.run().await.unwrap();

    assert_eq!(migrator.issue_map().get(3), Some(None));

    let requests = mutations(&log);
    // #3 is processed after #2, so the issue body keeps the reference.
    assert!(body_of(&requests[1], "body")
        .as_str()
        .unwrap()
        .ends_with("see #101 and #3"));
    assert!(body_of(&requests[2], "body")
        .as_str()
        .unwrap()
        .ends_with("dup of #<not_migrated>, related to #101"));
}

#[tokio::test]
async fn dry_run_sends_no_mutations() {
    let mut pr = issue(2, "Add feature", "");
    pr.is_pull = true;
    let source = MemorySource {
        issues: vec![issue(1, "Crash", ""), pr],
        pull_requests: [(102, vec![pull_request("feature", "master")])].into(),
        comments: [(101, vec![comment(2, "", common::CREATED + 5)])].into(),
        ..MemorySource::default()
    };
    let github = FakeGitHub::new();
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), true),
        settings(&EVERYTHING.replace("dryrun = false", "dryrun = true")),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(migrator.issue_map().get(1), Some(Some(42)));
    assert_eq!(migrator.issue_map().get(2), Some(Some(42)));
    assert!(mutations(&log).is_empty());
}

#[tokio::test]
async fn unmapped_users_need_confirmation() {
    let source = MemorySource {
        users: vec![user("ada", "ada@example.com"), user("bob", "bob@example.com")],
        ..MemorySource::default()
    };
    let github = FakeGitHub::new().with_user("ada@example.com", "ada-gh");

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(
            r#"
[migration]
dryrun = false
accounts_file = "does-not-exist"
"#,
        ),
    )
    .unwrap();
    let result = migrator.run().await;

    let error = result.unwrap_err();
    assert!(matches!(error, MigrationError::Aborted));
    assert_eq!(error.exit_code(), 0);
}

#[tokio::test]
async fn accounts_file_maps_users_and_assignees() {
    let temp = TempDir::new().unwrap();
    let accounts = temp.path().join("github-accounts");
    fs::write(&accounts, "# manual mappings\nbob bob-gh\n").unwrap();

    let mut assigned = issue(1, "Crash", "ping @bob");
    assigned.assignee = Some("bob".to_string());
    let source = MemorySource {
        users: vec![user("ada", "ada@example.com"), user("bob", "bob@example.com")],
        issues: vec![assigned],
        ..MemorySource::default()
    };
    let github = FakeGitHub::new().with_user("ada@example.com", "ada-gh");
    let log = github.log();

    let mut migrator = Migrator::new(
        source,
        client(github, CannedOperator::default(), false),
        settings(&format!(
            r#"
[migration]
dryrun = false
accounts_file = "{}"

[migration.issues]
migrate = ["open"]
assignees = ["open"]
"#,
            accounts.display()
        )),
    )
    .unwrap();
    let summary = migrator.run().await.unwrap();

    assert_eq!(summary.issues_created, 1);
    let requests = mutations(&log);
    assert_eq!(body_of(&requests[0], "assignees"), json!(["bob-gh"]));
    let body = body_of(&requests[0], "body");
    let body = body.as_str().unwrap();
    assert!(body.contains("created by [@ada-gh](https://github.com/ada-gh)"));
    assert!(body.contains("assigned to [@bob-gh](https://github.com/bob-gh)"));
    assert!(body.ends_with("ping [@bob-gh](https://github.com/bob-gh)"));
}
