//! Scripted fakes for client tests.

use crate::github::{
    ApiRequest, ApiResponse, FailureDecision, FailureReport, GitHubError, Operator, Transport,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn FnMut(&ApiRequest) -> ApiResponse + Send>;

/// Transport answering from a closure and recording every request.
pub struct ScriptedTransport {
    responder: Mutex<Responder>,
    log: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responder: impl FnMut(&ApiRequest) -> ApiResponse + Send + 'static) -> Self {
        Self {
            responder: Mutex::new(Box::new(responder)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far.
    pub fn log(&self) -> Arc<Mutex<Vec<ApiRequest>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, GitHubError> {
        self.log.lock().unwrap().push(request.clone());
        let mut responder = self.responder.lock().unwrap();
        Ok((*responder)(request))
    }
}

/// Operator replaying canned decisions; aborts once they run out.
#[derive(Default)]
pub struct ScriptedOperator {
    decisions: VecDeque<FailureDecision>,
    confirm: bool,
    failures: Arc<Mutex<Vec<String>>>,
}

impl ScriptedOperator {
    pub fn with_decisions(decisions: &[FailureDecision]) -> Self {
        Self {
            decisions: decisions.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirm = answer;
        self
    }

    /// Failure reports shown so far.
    pub fn failures(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.failures)
    }
}

impl Operator for ScriptedOperator {
    fn on_failure(&mut self, report: &FailureReport) -> FailureDecision {
        self.failures.lock().unwrap().push(report.to_string());
        self.decisions.pop_front().unwrap_or(FailureDecision::Abort)
    }

    fn confirm(&mut self, _question: &str) -> bool {
        self.confirm
    }
}
