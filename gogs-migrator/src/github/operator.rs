//! Operator decisions on unrecoverable API failures.

use serde_json::Value;
use std::fmt;

/// What to do after an API call failed without a rate-limit hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Send the identical request again.
    Retry,
    /// Continue without retrying, and do the same for every later failure
    /// without asking again.
    IgnoreHenceforth,
    /// Continue without retrying this once; the call produces no identifier.
    ContinueWithoutRetry,
    /// Stop the migration.
    Abort,
}

/// Description of a failed API call shown to the operator.
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// What was being attempted.
    pub context: String,
    /// HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Response body, or a `message` describing the transport error.
    pub body: Value,
}

impl FailureReport {
    /// Creates a report for a failed call.
    #[must_use]
    pub fn new(context: impl Into<String>, status: Option<u16>, body: Value) -> Self {
        Self {
            context: context.into(),
            status,
            body,
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context)?;
        if let Some(status) = self.status {
            write!(f, "\n\tstatus: {status}")?;
        }
        match &self.body {
            Value::Object(fields) => {
                for (key, value) in fields {
                    write!(f, "\n\t{key}: {value}")?;
                }
            }
            Value::Null => {}
            other => write!(f, "\n\t{other}")?,
        }
        Ok(())
    }
}

/// The person running the migration.
///
/// The CLI asks on the terminal; tests supply canned answers.
pub trait Operator: Send {
    /// Decides how to continue after an unrecoverable API failure.
    fn on_failure(&mut self, report: &FailureReport) -> FailureDecision;

    /// Asks a yes/no question; `true` means continue.
    fn confirm(&mut self, question: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_lists_body_fields() {
        let report = FailureReport::new(
            "Failed to create issue Crash",
            Some(422),
            json!({"message": "Validation Failed"}),
        );

        assert_eq!(
            report.to_string(),
            "Failed to create issue Crash\n\tstatus: 422\n\tmessage: \"Validation Failed\""
        );
    }
}
