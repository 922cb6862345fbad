//! Interactive operator prompts on the terminal.

use console::{style, Term};
use gogs_migrator::source::SourceError;
use gogs_migrator::{FailureDecision, FailureReport, Operator};
use tracing::warn;

/// Asks the person running the migration what to do.
pub struct ConsolePrompt {
    term: Term,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Reads the Gogs database password without echoing it.
    pub fn password(&mut self, username: &str, host: &str) -> Result<String, SourceError> {
        rpassword::prompt_password(format!("Password for {username}@{host}: "))
            .map_err(SourceError::Password)
    }

    fn ask(&self, question: &str) -> Option<String> {
        if let Err(e) = self.term.write_str(question) {
            warn!(error = %e, "Could not write prompt");
            return None;
        }
        match self.term.read_line() {
            Ok(answer) => Some(answer.trim().to_lowercase()),
            Err(e) => {
                warn!(error = %e, "Could not read answer");
                None
            }
        }
    }
}

fn parse_decision(answer: &str) -> Option<FailureDecision> {
    match answer {
        "t" | "try" => Some(FailureDecision::Retry),
        "i" | "ignore" => Some(FailureDecision::IgnoreHenceforth),
        "c" | "continue" => Some(FailureDecision::ContinueWithoutRetry),
        "q" | "quit" => Some(FailureDecision::Abort),
        _ => None,
    }
}

fn parse_confirmation(answer: &str) -> Option<bool> {
    match answer {
        "" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Operator for ConsolePrompt {
    fn on_failure(&mut self, report: &FailureReport) -> FailureDecision {
        let line = format!("{} {report}", style("Request failed:").red().bold());
        if let Err(e) = self.term.write_line(&line) {
            warn!(error = %e, "Could not write failure report");
        }

        loop {
            let Some(answer) = self.ask(
                "[t]ry again, [i]gnore all errors from now on, [c]ontinue without retrying, [q]uit? ",
            ) else {
                return FailureDecision::Abort;
            };
            if let Some(decision) = parse_decision(&answer) {
                return decision;
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let Some(answer) = self.ask(&format!("{question} [Y/n] ")) else {
                return false;
            };
            if let Some(confirmed) = parse_confirmation(&answer) {
                return confirmed;
            }
        }
    }
}
