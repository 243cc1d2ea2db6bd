//! One Marshal run: resolve, dispatch, poll, report.
//!
//! The phases run strictly in sequence and an error in one never feeds the
//! next. Sync mode skips resolution and polling entirely.

use tracing::{info, warn};

use crate::check_run::CheckRunId;
use crate::context::{DispatchMode, RunContext};
use crate::dispatch::{Dispatched, ValidationBackend, ValidationRequest};
use crate::error::{MarshalError, Result};
use crate::outcome::{OutcomeReporter, ValidationOutcome};
use crate::poller::CompletionPoller;
use crate::resolver::CheckResolver;
use crate::retry::Sleeper;
use crate::status_checks::StatusCheckClient;

/// Wires the collaborators for a single run.
pub struct ValidationRun<'a> {
    checks: &'a dyn StatusCheckClient,
    backend: &'a dyn ValidationBackend,
    sleeper: &'a dyn Sleeper,
}

impl<'a> ValidationRun<'a> {
    pub fn new(
        checks: &'a dyn StatusCheckClient,
        backend: &'a dyn ValidationBackend,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            checks,
            backend,
            sleeper,
        }
    }

    /// Run to a verdict. A failing verdict is returned as an outcome, not
    /// an error; see [`ValidationOutcome::into_result`].
    pub async fn execute(&self, ctx: &RunContext) -> Result<ValidationOutcome> {
        info!(
            repo = %ctx.repo.slug(),
            pull_request = ctx.pull_request.number,
            revision = %ctx.revision(),
            mode = ?ctx.mode,
            "Starting Marshal validation"
        );

        let outcome = match ctx.mode {
            DispatchMode::Async => self.execute_async(ctx).await?,
            DispatchMode::Sync => self.execute_sync(ctx).await?,
        };

        if outcome.passed {
            info!(summary = %outcome.summary, "Validation passed");
        } else {
            warn!(summary = %outcome.summary, "Validation failed");
        }
        Ok(outcome)
    }

    async fn execute_async(&self, ctx: &RunContext) -> Result<ValidationOutcome> {
        let check_run_id = match ctx.check_run_id {
            Some(id) => {
                info!(check_run_id = %id, "Using supplied check run, skipping resolution");
                id
            }
            None => self.resolve(ctx).await?,
        };

        let request = ValidationRequest::from_context(ctx, Some(check_run_id));
        match self.backend.dispatch(&request).await? {
            Dispatched::Accepted => {}
            Dispatched::Completed(_) => {
                return Err(MarshalError::Dispatch(
                    "backend answered inline although a check run was supplied".to_string(),
                ))
            }
        }

        let poller = CompletionPoller::new(self.checks, self.sleeper, ctx.poll.poll);
        let record = poller.wait_for_completion(check_run_id).await?;
        Ok(OutcomeReporter::from_check(&record))
    }

    async fn execute_sync(&self, ctx: &RunContext) -> Result<ValidationOutcome> {
        let request = ValidationRequest::from_context(ctx, None);
        let outcome = match self.backend.dispatch(&request).await? {
            Dispatched::Completed(outcome) => outcome,
            Dispatched::Accepted => {
                return Err(MarshalError::Dispatch(
                    "backend deferred the verdict but no check run was supplied".to_string(),
                ))
            }
        };

        let published = self
            .checks
            .create(&outcome.to_check_run(ctx.revision()))
            .await?;
        info!(check_run_id = %published.id, name = %published.name, "Published validation report");

        Ok(outcome)
    }

    async fn resolve(&self, ctx: &RunContext) -> Result<CheckRunId> {
        CheckResolver::new(self.checks, self.sleeper, ctx.poll.resolve)
            .resolve(ctx.revision(), &ctx.match_by)
            .await
    }
}
