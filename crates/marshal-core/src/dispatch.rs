//! Validation backend dispatch
//!
//! A run sends exactly one [`ValidationRequest`]. With a check-run id the
//! backend acknowledges with `202 Accepted` and reports through the check
//! run later; without one it answers inline with a verdict. Failures are
//! never retried because a resend can start a second analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::check_run::{CheckRunId, CheckRunRecord};
use crate::context::{DispatchMode, RunContext};
use crate::error::{MarshalError, Result};
use crate::http::{build_client, trim_base, truncate_body};
use crate::outcome::{OutcomeReporter, ValidationOutcome};

/// Path of the validation endpoint below the backend base URL.
pub const VALIDATE_PATH: &str = "validate_diff";

/// Payload sent to the validation backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub owner: String,
    pub repo: String,
    pub commit: String,
    pub diff: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_run_id: Option<CheckRunId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
}

impl ValidationRequest {
    pub fn from_context(ctx: &RunContext, check_run_id: Option<CheckRunId>) -> Self {
        ValidationRequest {
            owner: ctx.repo.owner.clone(),
            repo: ctx.repo.name.clone(),
            commit: ctx.revision().to_string(),
            diff: ctx.diff.clone(),
            prompt: ctx.prompt.clone(),
            check_run_id,
            branch: ctx.pull_request.branch.clone(),
            pr_number: Some(ctx.pull_request.number),
        }
    }

    /// Async when the backend has a check run to report into.
    pub fn mode(&self) -> DispatchMode {
        if self.check_run_id.is_some() {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        }
    }
}

/// What the backend handed back for a dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Async mode: queued, the verdict arrives on the check run.
    Accepted,
    /// Sync mode: the verdict itself.
    Completed(ValidationOutcome),
}

/// Lint and test results reported by older backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestResults {
    #[serde(default)]
    pub lint: bool,
    #[serde(default)]
    pub tests: bool,
}

/// Inline verdict returned in sync mode.
///
/// Accepts both `{pass, score, reason}` and the older
/// `{status: "pass", semanticScore, tests, previewUrl}` shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncVerdict {
    #[serde(default)]
    pub pass: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "semanticScore")]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub tests: Option<TestResults>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl SyncVerdict {
    /// `pass` wins over `status`; `None` when the body carries neither.
    pub fn passed(&self) -> Option<bool> {
        self.pass
            .or_else(|| self.status.as_deref().map(|s| s.eq_ignore_ascii_case("pass")))
    }
}

/// Any body a sync-mode backend may answer with.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SyncBody {
    Check(CheckRunRecord),
    Verdict(SyncVerdict),
}

impl SyncBody {
    pub fn parse(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            MarshalError::Dispatch(format!(
                "backend returned a non-JSON verdict ({e}): {}",
                truncate_body(body)
            ))
        })?;
        serde_json::from_value(value).map_err(|e| {
            MarshalError::Dispatch(format!(
                "backend verdict matches no known shape ({e}): {}",
                truncate_body(body)
            ))
        })
    }

    pub fn into_outcome(self) -> Result<ValidationOutcome> {
        match self {
            SyncBody::Check(record) if record.is_completed() => {
                Ok(OutcomeReporter::from_check(&record))
            }
            SyncBody::Check(record) => Err(MarshalError::Dispatch(format!(
                "backend returned check run {} in state {}",
                record.id,
                record.status.as_str()
            ))),
            SyncBody::Verdict(verdict) => OutcomeReporter::from_verdict(&verdict),
        }
    }
}

/// The validation backend seam.
#[async_trait]
pub trait ValidationBackend: Send + Sync {
    /// Send the request once.
    async fn dispatch(&self, request: &ValidationRequest) -> Result<Dispatched>;
}

/// Backend reached over HTTP with an API key.
pub struct HttpValidationBackend {
    endpoint: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl HttpValidationBackend {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        if api_url.trim().is_empty() {
            return Err(MarshalError::Configuration("api-url is required".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(MarshalError::Configuration("api-key is required".to_string()));
        }

        Ok(HttpValidationBackend {
            endpoint: format!("{}/{}", trim_base(api_url), VALIDATE_PATH),
            api_key: api_key.to_string(),
            http_client: build_client()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ValidationBackend for HttpValidationBackend {
    async fn dispatch(&self, request: &ValidationRequest) -> Result<Dispatched> {
        let mode = request.mode();
        info!(
            endpoint = %self.endpoint,
            commit = %request.commit,
            mode = ?mode,
            diff_bytes = request.diff.len(),
            "Dispatching validation request"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                MarshalError::Dispatch(format!("request to {} failed: {e}", self.endpoint))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarshalError::Dispatch(format!("failed to read response body: {e}")))?;

        match (mode, status) {
            (DispatchMode::Async, reqwest::StatusCode::ACCEPTED) => {
                info!("Backend accepted request for asynchronous analysis");
                Ok(Dispatched::Accepted)
            }
            (DispatchMode::Sync, reqwest::StatusCode::OK) => {
                SyncBody::parse(&body)?.into_outcome().map(Dispatched::Completed)
            }
            _ => {
                warn!(status = status.as_u16(), mode = ?mode, "Unexpected backend response");
                Err(MarshalError::Dispatch(format!(
                    "backend returned {status} in {} mode: {}",
                    match mode {
                        DispatchMode::Async => "async",
                        DispatchMode::Sync => "sync",
                    },
                    truncate_body(&body)
                )))
            }
        }
    }
}
