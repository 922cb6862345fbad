//! Request and response bodies of the GitHub REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Body of `PATCH /repos/{owner}/{repo}/issues/{number}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

impl IssueUpdate {
    /// Update that only changes the state.
    #[must_use]
    pub fn state(state: &str) -> Self {
        Self {
            state: Some(state.to_string()),
            ..Self::default()
        }
    }

    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.labels.is_none()
            && self.assignees.is_none()
            && self.milestone.is_none()
    }
}

/// Body of `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// Body of `POST /repos/{owner}/{repo}/milestones`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMilestone {
    pub title: String,
    pub state: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
}

/// A label as returned by GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Reads a numeric field such as `number` or `id` from a response body.
#[must_use]
pub fn number_field(body: &Value, field: &str) -> Option<u64> {
    body.get(field).and_then(Value::as_u64)
}

/// Values of the `assignees` field that a validation failure rejected.
#[must_use]
pub fn rejected_assignees(body: &Value) -> Vec<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|error| error.get("field").and_then(Value::as_str) == Some("assignees"))
        .filter_map(|error| error.get("value").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}

/// Removes rejected assignees from `assignees`, returning true if any were
/// removed.
pub fn drop_rejected_assignees(assignees: &mut Option<Vec<String>>, body: &Value) -> bool {
    let Some(list) = assignees.as_mut() else {
        return false;
    };

    let before = list.len();
    for rejected in rejected_assignees(body) {
        list.retain(|assignee| *assignee != rejected);
    }
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_issue_omits_unset_fields() {
        let issue = NewIssue {
            title: "Crash".to_string(),
            body: "boom".to_string(),
            ..NewIssue::default()
        };

        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({"title": "Crash", "body": "boom"})
        );
    }

    #[test]
    fn drops_only_the_rejected_assignee() {
        let mut assignees = Some(vec!["alice".to_string(), "bob".to_string()]);
        let body = json!({
            "message": "Validation Failed",
            "errors": [
                {"resource": "Issue", "code": "invalid", "field": "assignees", "value": "bob"}
            ]
        });

        assert!(drop_rejected_assignees(&mut assignees, &body));
        assert_eq!(assignees, Some(vec!["alice".to_string()]));
        assert!(!drop_rejected_assignees(&mut assignees, &body));
    }

    #[test]
    fn ignores_errors_on_other_fields() {
        let mut assignees = Some(vec!["alice".to_string()]);
        let body = json!({"errors": [{"field": "milestone", "value": 3}, "plain text"]});

        assert!(!drop_rejected_assignees(&mut assignees, &body));
        assert!(rejected_assignees(&body).is_empty());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(IssueUpdate::default().is_empty());
        assert!(!IssueUpdate::state("closed").is_empty());
    }
}
