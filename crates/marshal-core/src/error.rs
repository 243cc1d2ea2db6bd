//! Error types for Marshal runs

use crate::check_run::CheckRunId;
use thiserror::Error;

/// Errors that end a Marshal run.
///
/// Every variant is fatal to the run. `ValidationFailed` is the one
/// legitimate terminal outcome; the rest mean the verdict could not be
/// determined.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// A required input is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Phase 1 never found a check run for the revision
    #[error("No pending check run found for revision {revision} after {attempts} attempt(s)")]
    ResolutionTimeout { revision: String, attempts: u32 },

    /// The validation backend rejected the request or could not be reached
    #[error("Validation dispatch failed: {0}")]
    Dispatch(String),

    /// Phase 2 never observed the check run complete
    #[error("Check run {check_run_id} did not complete after {attempts} poll(s)")]
    PollTimeout {
        check_run_id: CheckRunId,
        attempts: u32,
    },

    /// The check completed with a non-success conclusion
    #[error("Marshal validation failed: {0}")]
    ValidationFailed(String),

    /// The status-check service returned an error
    #[error("Status check service error: {0}")]
    StatusCheck(String),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Marshal operations
pub type Result<T> = std::result::Result<T, MarshalError>;
