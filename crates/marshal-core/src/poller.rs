//! Phase 2: wait for a resolved check run to complete.

use tracing::{debug, info};

use crate::check_run::{CheckRunId, CheckRunRecord};
use crate::error::{MarshalError, Result};
use crate::retry::{retry, RetryError, RetryPolicy, Sleeper};
use crate::status_checks::StatusCheckClient;

/// Polls one check run on a fixed interval until it reports `completed`.
///
/// The id is fixed at construction; the poller never re-resolves it.
pub struct CompletionPoller<'a> {
    client: &'a dyn StatusCheckClient,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> CompletionPoller<'a> {
    pub fn new(
        client: &'a dyn StatusCheckClient,
        sleeper: &'a dyn Sleeper,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            sleeper,
            policy,
        }
    }

    /// Return the first fetched record whose status is `completed`.
    pub async fn wait_for_completion(&self, id: CheckRunId) -> Result<CheckRunRecord> {
        info!(
            check_run_id = %id,
            max_attempts = self.policy.max_attempts,
            interval_ms = self.policy.interval_ms,
            "Waiting for check run to complete"
        );

        let outcome = retry(&self.policy, self.sleeper, |attempt| async move {
            let record = self.client.get(id).await?;
            debug!(
                attempt,
                check_run_id = %id,
                status = record.status.as_str(),
                "Polled check run"
            );
            Ok::<_, MarshalError>(record.is_completed().then_some(record))
        })
        .await;

        match outcome {
            Ok(record) => {
                info!(
                    check_run_id = %id,
                    conclusion = record.conclusion.as_ref().map(|c| c.as_str()).unwrap_or("none"),
                    "Check run completed"
                );
                Ok(record)
            }
            Err(RetryError::Exhausted { attempts }) => Err(MarshalError::PollTimeout {
                check_run_id: id,
                attempts,
            }),
            Err(RetryError::Aborted(err)) => Err(err),
        }
    }
}
