//! Check-run records as served by the status-check service.
//!
//! These are read-only copies: every poll tick fetches a fresh record and
//! nothing here is cached between ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commit the check runs are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub String);

impl Revision {
    pub fn new(sha: impl Into<String>) -> Self {
        Revision(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a check run, assigned by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckRunId(pub u64);

impl std::fmt::Display for CheckRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a check run.
///
/// `Completed` is the only terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Requested,
    Pending,
}

impl CheckStatus {
    pub fn is_completed(self) -> bool {
        self == CheckStatus::Completed
    }

    /// Wire name used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Queued => "queued",
            CheckStatus::InProgress => "in_progress",
            CheckStatus::Completed => "completed",
            CheckStatus::Waiting => "waiting",
            CheckStatus::Requested => "requested",
            CheckStatus::Pending => "pending",
        }
    }
}

/// Terminal verdict of a completed check run.
///
/// Values the platform adds later land in `Unknown` instead of failing
/// deserialization; they are treated as non-success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    StartupFailure,
    Unknown(String),
}

impl CheckConclusion {
    /// Every conclusion the platform currently documents.
    pub const KNOWN: [CheckConclusion; 9] = [
        CheckConclusion::Success,
        CheckConclusion::Failure,
        CheckConclusion::Neutral,
        CheckConclusion::Cancelled,
        CheckConclusion::Skipped,
        CheckConclusion::TimedOut,
        CheckConclusion::ActionRequired,
        CheckConclusion::Stale,
        CheckConclusion::StartupFailure,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
            CheckConclusion::Neutral => "neutral",
            CheckConclusion::Cancelled => "cancelled",
            CheckConclusion::Skipped => "skipped",
            CheckConclusion::TimedOut => "timed_out",
            CheckConclusion::ActionRequired => "action_required",
            CheckConclusion::Stale => "stale",
            CheckConclusion::StartupFailure => "startup_failure",
            CheckConclusion::Unknown(other) => other,
        }
    }

    pub fn is_success(&self) -> bool {
        *self == CheckConclusion::Success
    }
}

impl From<String> for CheckConclusion {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => CheckConclusion::Success,
            "failure" => CheckConclusion::Failure,
            "neutral" => CheckConclusion::Neutral,
            "cancelled" => CheckConclusion::Cancelled,
            "skipped" => CheckConclusion::Skipped,
            "timed_out" => CheckConclusion::TimedOut,
            "action_required" => CheckConclusion::ActionRequired,
            "stale" => CheckConclusion::Stale,
            "startup_failure" => CheckConclusion::StartupFailure,
            _ => CheckConclusion::Unknown(value),
        }
    }
}

impl From<CheckConclusion> for String {
    fn from(value: CheckConclusion) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for CheckConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report attached to a check run. Only meaningful once completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One check-run instance on a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRunRecord {
    pub id: CheckRunId,

    /// Logical job name, e.g. `build` or `marshal/validate`.
    pub name: String,

    #[serde(default)]
    pub head_sha: String,

    pub status: CheckStatus,

    /// Present only when `status` is `completed`.
    #[serde(default)]
    pub conclusion: Option<CheckConclusion>,

    #[serde(default)]
    pub output: CheckOutput,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CheckRunRecord {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Server-side filters for listing check runs on a revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only runs with exactly this name.
    pub name: Option<String>,
    /// Only runs in this state.
    pub status: Option<CheckStatus>,
}

impl ListFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status: None,
        }
    }
}

/// A completed check run to publish on a revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    pub conclusion: CheckConclusion,
    pub output: CheckOutput,
}
