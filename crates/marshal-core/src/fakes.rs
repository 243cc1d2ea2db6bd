//! In-memory fakes for the client seams (testing only)
//!
//! Provides `ScriptedStatusChecks`, `ScriptedBackend` and `RecordingSleeper`
//! that satisfy the trait contracts without any network or timer.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::check_run::{
    CheckConclusion, CheckOutput, CheckRunId, CheckRunRecord, CheckStatus, ListFilter, NewCheckRun,
    Revision,
};
use crate::dispatch::{Dispatched, ValidationBackend, ValidationRequest};
use crate::error::{MarshalError, Result};
use crate::retry::Sleeper;

/// Pending check run with an empty output.
pub fn record(id: u64, name: &str, status: CheckStatus) -> CheckRunRecord {
    CheckRunRecord {
        id: CheckRunId(id),
        name: name.to_string(),
        head_sha: String::new(),
        status,
        conclusion: None,
        output: CheckOutput::default(),
        started_at: None,
        completed_at: None,
    }
}

/// Completed check run whose output title is `title`.
pub fn completed(id: u64, name: &str, conclusion: CheckConclusion, title: &str) -> CheckRunRecord {
    CheckRunRecord {
        conclusion: Some(conclusion),
        output: CheckOutput {
            title: Some(title.to_string()),
            summary: None,
            text: None,
        },
        ..record(id, name, CheckStatus::Completed)
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

/// Records requested sleeps and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// ScriptedStatusChecks
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ChecksState {
    list_script: VecDeque<Vec<CheckRunRecord>>,
    list_error: Option<String>,
    get_script: VecDeque<CheckRunRecord>,
    default_get: Option<CheckRunRecord>,
    get_error_after: Option<(usize, String)>,
    list_calls: Vec<(Revision, ListFilter)>,
    get_calls: Vec<CheckRunId>,
    created: Vec<NewCheckRun>,
}

/// Status-check service that replays queued responses.
///
/// `list` pops one scripted page per call and returns an empty page once
/// the script runs out. `get` pops scripted records, then falls back to the
/// default record if one is set.
#[derive(Debug, Default)]
pub struct ScriptedStatusChecks {
    state: Mutex<ChecksState>,
}

impl ScriptedStatusChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, records: Vec<CheckRunRecord>) {
        self.state.lock().unwrap().list_script.push_back(records);
    }

    /// Make every `list` call fail.
    pub fn fail_list(&self, message: &str) {
        self.state.lock().unwrap().list_error = Some(message.to_string());
    }

    pub fn push_get(&self, record: CheckRunRecord) {
        self.state.lock().unwrap().get_script.push_back(record);
    }

    pub fn set_default_get(&self, record: CheckRunRecord) {
        self.state.lock().unwrap().default_get = Some(record);
    }

    /// Fail every `get` after the first `successes` calls.
    pub fn fail_get_after(&self, successes: usize, message: &str) {
        self.state.lock().unwrap().get_error_after = Some((successes, message.to_string()));
    }

    pub fn list_calls(&self) -> Vec<(Revision, ListFilter)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn get_calls(&self) -> Vec<CheckRunId> {
        self.state.lock().unwrap().get_calls.clone()
    }

    pub fn created(&self) -> Vec<NewCheckRun> {
        self.state.lock().unwrap().created.clone()
    }
}

#[async_trait]
impl crate::status_checks::StatusCheckClient for ScriptedStatusChecks {
    async fn list(&self, revision: &Revision, filter: &ListFilter) -> Result<Vec<CheckRunRecord>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((revision.clone(), filter.clone()));
        if let Some(message) = &state.list_error {
            return Err(MarshalError::StatusCheck(message.clone()));
        }
        Ok(state.list_script.pop_front().unwrap_or_default())
    }

    async fn get(&self, id: CheckRunId) -> Result<CheckRunRecord> {
        let mut state = self.state.lock().unwrap();
        let previous_calls = state.get_calls.len();
        state.get_calls.push(id);

        if let Some((successes, message)) = &state.get_error_after {
            if previous_calls >= *successes {
                return Err(MarshalError::StatusCheck(message.clone()));
            }
        }

        state
            .get_script
            .pop_front()
            .or_else(|| state.default_get.clone())
            .ok_or_else(|| MarshalError::StatusCheck(format!("check run {id} not found")))
    }

    async fn create(&self, check: &NewCheckRun) -> Result<CheckRunRecord> {
        let mut state = self.state.lock().unwrap();
        state.created.push(check.clone());
        let id = 1_000 + state.created.len() as u64;
        Ok(CheckRunRecord {
            conclusion: Some(check.conclusion.clone()),
            output: check.output.clone(),
            head_sha: check.head_sha.clone(),
            ..record(id, &check.name, check.status)
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedBackend
// ---------------------------------------------------------------------------

/// Validation backend that answers every dispatch with one fixed response.
#[derive(Debug)]
pub struct ScriptedBackend {
    response: Mutex<Option<Result<Dispatched>>>,
    requests: Mutex<Vec<ValidationRequest>>,
}

impl ScriptedBackend {
    pub fn accepting() -> Self {
        Self::with_response(Ok(Dispatched::Accepted))
    }

    pub fn with_response(response: Result<Dispatched>) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ValidationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValidationBackend for ScriptedBackend {
    async fn dispatch(&self, request: &ValidationRequest) -> Result<Dispatched> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(MarshalError::Dispatch("request dispatched twice".to_string())))
    }
}
