//! Phase 1: locate the check run that belongs to the current job.
//!
//! The platform creates the job's check run asynchronously, so it may not
//! be listed yet when Marshal starts. The resolver lists the revision's
//! check runs on a fixed interval until a pending candidate shows up.

use tracing::{debug, info};

use crate::check_run::{CheckRunId, CheckRunRecord, ListFilter, Revision};
use crate::context::MatchBy;
use crate::error::{MarshalError, Result};
use crate::retry::{retry, RetryError, RetryPolicy, Sleeper};
use crate::status_checks::StatusCheckClient;

/// Pick the first check run that is still pending and, when a name is
/// given, carries that name.
pub fn select_candidate<'a>(
    records: &'a [CheckRunRecord],
    name: Option<&str>,
) -> Option<&'a CheckRunRecord> {
    records
        .iter()
        .filter(|r| !r.is_completed())
        .find(|r| name.map_or(true, |n| r.name == n))
}

/// Finds the job's check-run id on a revision.
pub struct CheckResolver<'a> {
    client: &'a dyn StatusCheckClient,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> CheckResolver<'a> {
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

    /// Resolve the check-run id, or fail with `ResolutionTimeout` once the
    /// attempt budget is spent. A failing list call aborts immediately.
    pub async fn resolve(&self, revision: &Revision, match_by: &MatchBy) -> Result<CheckRunId> {
        let name = match_by.name();
        let filter = match name {
            Some(n) => ListFilter::by_name(n),
            None => ListFilter::default(),
        };

        info!(
            revision = %revision,
            check_name = name.unwrap_or("<any pending>"),
            max_attempts = self.policy.max_attempts,
            "Resolving check run"
        );

        let filter = &filter;
        let outcome = retry(&self.policy, self.sleeper, |attempt| async move {
            let records = self.client.list(revision, filter).await?;
            let found = select_candidate(&records, name).map(|r| r.id);
            debug!(attempt, listed = records.len(), found = ?found, "Check run lookup");
            Ok::<_, MarshalError>(found)
        })
        .await;

        match outcome {
            Ok(id) => {
                info!(revision = %revision, check_run_id = %id, "Resolved check run");
                Ok(id)
            }
            Err(RetryError::Exhausted { attempts }) => Err(MarshalError::ResolutionTimeout {
                revision: revision.to_string(),
                attempts,
            }),
            Err(RetryError::Aborted(err)) => Err(err),
        }
    }
}
