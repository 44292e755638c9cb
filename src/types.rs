use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// What a single probe reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    /// Remediation or context shown under the message.
    #[serde(serialize_with = "empty_when_none")]
    pub details: Option<String>,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// How an outcome counts toward the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedOutcome {
    pub name: String,
    pub required: bool,
    pub result: CheckOutcome,
}

impl NamedOutcome {
    pub fn status(&self) -> Status {
        match (self.result.passed, self.required) {
            (true, _) => Status::Passed,
            (false, true) => Status::Failed,
            (false, false) => Status::Warning,
        }
    }
}

/// Aggregate of one full run. `can_deploy` holds iff `failed == 0`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    pub timestamp: DateTime<Local>,
    pub environment: String,
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub checks: Vec<NamedOutcome>,
    pub can_deploy: bool,
}

fn empty_when_none<S: Serializer>(details: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(details.as_deref().unwrap_or(""))
}
