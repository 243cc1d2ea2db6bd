//! Run context: everything a Marshal run needs, resolved once at startup.
//!
//! Nothing downstream reads the environment or the event payload directly;
//! the binary builds a [`RunContext`] and every component borrows it.

use serde::Deserialize;

use crate::check_run::{CheckRunId, Revision};
use crate::error::{MarshalError, Result};
use crate::retry::PollConfig;

/// Repository the pull request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/repo` slug as found in `GITHUB_REPOSITORY`.
    pub fn parse(slug: &str) -> Result<Self> {
        match slug.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(MarshalError::Configuration(format!(
                "repository must be in owner/repo form, got '{slug}'"
            ))),
        }
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// How Phase 1 tells the job's own check run apart from its neighbours.
///
/// Matching by name is reliable only when the name is unique among the jobs
/// running on the revision. `StatusOnly` takes the first check that has not
/// completed and can pick another job's check when several run at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchBy {
    Name(String),
    StatusOnly,
}

impl MatchBy {
    pub fn name(&self) -> Option<&str> {
        match self {
            MatchBy::Name(name) => Some(name),
            MatchBy::StatusOnly => None,
        }
    }
}

/// Whether the backend reports through a check run or answers inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Dispatch with a check-run id, expect 202, then poll the check.
    Async,
    /// Dispatch without an id and read the verdict from the response.
    Sync,
}

/// Pull request the run validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    pub number: u64,
    pub revision: Revision,
    pub branch: Option<String>,
    pub body: Option<String>,
}

impl PullRequestInfo {
    /// Extract the pull request from a GitHub event payload.
    pub fn from_event_json(payload: &str) -> Result<Self> {
        let event: EventPayload = serde_json::from_str(payload)?;
        let pr = event.pull_request.ok_or_else(|| {
            MarshalError::Configuration("No pull_request found in the event payload".to_string())
        })?;

        if pr.head.sha.trim().is_empty() {
            return Err(MarshalError::Configuration(
                "pull_request.head.sha is empty".to_string(),
            ));
        }

        Ok(PullRequestInfo {
            number: pr.number,
            revision: Revision::new(pr.head.sha),
            branch: pr.head.branch.filter(|b| !b.is_empty()),
            body: pr.body,
        })
    }
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
    head: EventHead,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Deserialize)]
struct EventHead {
    sha: String,
    #[serde(rename = "ref", default)]
    branch: Option<String>,
}

/// Pick the prompt: an explicit override wins, then the pull request body.
pub fn resolve_prompt(override_prompt: Option<&str>, body: Option<&str>) -> String {
    override_prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .or_else(|| body.map(str::trim).filter(|b| !b.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// Immutable inputs for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub repo: RepoRef,
    pub pull_request: PullRequestInfo,
    /// Unified diff of the pull request.
    pub diff: String,
    /// Free-text intent handed to the backend.
    pub prompt: String,
    pub mode: DispatchMode,
    pub match_by: MatchBy,
    /// The job's check run when already known; skips Phase 1.
    pub check_run_id: Option<CheckRunId>,
    pub poll: PollConfig,
}

impl RunContext {
    pub fn revision(&self) -> &Revision {
        &self.pull_request.revision
    }
}
