//! Marshal Core - pull-request validation reconciled onto GitHub check runs
//!
//! A run hands a pull request's diff and intent to the validation backend,
//! then reports the verdict through a check run:
//! - `resolver`: find the job's own check run (it may not exist yet)
//! - `dispatch`: send the request once, async (202) or sync (inline verdict)
//! - `poller`: wait for the check run to complete
//! - `outcome`: map the terminal state to pass/fail
//!
//! `pipeline::ValidationRun` chains the phases for one [`RunContext`].

pub mod check_run;
pub mod context;
pub mod dispatch;
mod error;
pub mod fakes;
pub mod http;
pub mod outcome;
pub mod pipeline;
pub mod poller;
pub mod resolver;
pub mod retry;
pub mod status_checks;
pub mod telemetry;

pub use check_run::{
    CheckConclusion, CheckOutput, CheckRunId, CheckRunRecord, CheckStatus, ListFilter,
    NewCheckRun, Revision,
};
pub use context::{resolve_prompt, DispatchMode, MatchBy, PullRequestInfo, RepoRef, RunContext};
pub use dispatch::{
    Dispatched, HttpValidationBackend, SyncBody, SyncVerdict, ValidationBackend, ValidationRequest,
};
pub use error::{MarshalError, Result};
pub use outcome::{OutcomeReporter, ValidationOutcome, REPORT_CHECK_NAME};
pub use pipeline::ValidationRun;
pub use poller::CompletionPoller;
pub use resolver::{select_candidate, CheckResolver};
pub use retry::{retry, PollConfig, RetryError, RetryPolicy, Sleeper, TokioSleeper};
pub use status_checks::{GitHubClient, StatusCheckClient, DEFAULT_API_BASE};
pub use telemetry::init_tracing;

/// Marshal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
