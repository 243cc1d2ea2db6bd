//! Bounded fixed-interval retry shared by check resolution and completion polling.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

/// Default pause between attempts in both phases (milliseconds).
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;

/// Default attempt budget for locating the job's check run.
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 10;

/// Default attempt budget for waiting on completion.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;

/// Suspension point between attempts.
///
/// Production code sleeps on the tokio timer; tests swap in a recorder so
/// they never wait in real time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and pause for one retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (values below 1 still run once).
    pub max_attempts: u32,
    /// Fixed pause between attempts (milliseconds).
    pub interval_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Longest time the loop can spend sleeping.
    pub fn max_wait(&self) -> Duration {
        self.interval() * self.attempts().saturating_sub(1)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Polling budgets for both phases of a run.
///
/// `poll.max_attempts * interval` is the longest backend analysis this run
/// tolerates. Raise both together for slower backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub resolve: RetryPolicy,
    pub poll: RetryPolicy,
}

impl PollConfig {
    pub fn new(resolve_attempts: u32, poll_attempts: u32, interval: Duration) -> Self {
        Self {
            resolve: RetryPolicy::new(resolve_attempts, interval),
            poll: RetryPolicy::new(poll_attempts, interval),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_RESOLVE_ATTEMPTS,
            DEFAULT_POLL_ATTEMPTS,
            Duration::from_millis(DEFAULT_INTERVAL_MS),
        )
    }
}

/// Why a retry loop stopped without a value.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt ran and none produced a value.
    Exhausted { attempts: u32 },
    /// An attempt failed outright; no further attempts were made.
    Aborted(E),
}

/// Run `attempt_fn` until it yields `Some`, at most `policy.max_attempts` times.
///
/// `attempt_fn` receives the 1-based attempt number. `Ok(None)` means "not
/// yet" and schedules another attempt after the fixed interval; `Err` stops
/// the loop immediately. There is no sleep after the final attempt or after
/// a success, so a value found on attempt `k` costs exactly `k - 1` sleeps.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut attempt_fn: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let max_attempts = policy.attempts();

    for attempt in 1..=max_attempts {
        match attempt_fn(attempt).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                if attempt < max_attempts {
                    sleeper.sleep(policy.interval()).await;
                }
            }
            Err(err) => return Err(RetryError::Aborted(err)),
        }
    }

    Err(RetryError::Exhausted {
        attempts: max_attempts,
    })
}
