//! Task runner: retry with exponential backoff, timeouts, and both combined
//!
//! Every wrapper takes the caller's [`CancellationToken`] and hands the work a
//! child token scoped to the current attempt, cancelled once the attempt is
//! over. Only ordinary failures are retried or transformed;
//! [`Error::Cancelled`] always propagates unchanged.
//!
//! ```ignore
//! let users = with_retry_and_timeout(&policy, &spec, &cancel, |attempt| {
//!     let api = api.clone();
//!     async move { api.fetch_users_unstable(&attempt).await }
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use fetchflow_core::prelude::*;
use tokio_util::sync::CancellationToken;

pub use fetchflow_remote::sleep;

/// Default number of attempts for [`RetryPolicy::default`]
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Default multiplier applied to the delay after each failed attempt
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default message carried by timeout errors
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "The operation exceeded the time limit";

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

/// How many times to run a unit of work and how long to wait in between.
///
/// The delay before attempt `n` (n >= 2) is
/// `initial_delay * backoff_factor^(n-2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Build a validated policy.
    ///
    /// Rejects `max_attempts == 0` and factors below 1.0 (or not finite).
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_factor: f64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::config_invalid("retry max_attempts must be at least 1"));
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(Error::config_invalid(format!(
                "retry backoff_factor must be >= 1.0, got {}",
                backoff_factor
            )));
        }
        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_factor,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Delay to wait before `attempt` (1-based). The first attempt has none.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Time limit for one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutSpec {
    limit: Duration,
    error_message: String,
}

impl TimeoutSpec {
    /// Build a validated spec; `limit` must be non-zero.
    pub fn new(limit: Duration, error_message: impl Into<String>) -> Result<Self> {
        if limit.is_zero() {
            return Err(Error::config_invalid("timeout limit must be greater than zero"));
        }
        Ok(Self {
            limit,
            error_message: error_message.into(),
        })
    }

    /// Spec with [`DEFAULT_TIMEOUT_MESSAGE`]
    pub fn with_limit(limit: Duration) -> Result<Self> {
        Self::new(limit, DEFAULT_TIMEOUT_MESSAGE)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

/// Delay the runner waits before `attempt` under `policy`
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.delay_before(attempt)
}

// ─────────────────────────────────────────────────────────────────────────────
// Wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// Run `work` up to `policy.max_attempts()` times with exponential backoff.
///
/// See [`with_retry_notify`] for the failure semantics.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    work: F,
) -> Result<T>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_notify(policy, cancel, |_, _| {}, work).await
}

/// Run `work` with retries, calling `on_retry(attempt, &error)` after every
/// failed attempt.
///
/// - Success returns immediately.
/// - An ordinary failure is recorded, reported to `on_retry`, and followed by
///   the backoff delay unless it was the final attempt.
/// - When every attempt fails the result is [`Error::RetriesExhausted`]
///   wrapping the last attempt's error.
/// - [`Error::Cancelled`] (returned by the work, or observed while running
///   or backing off) propagates at once and is never retried.
pub async fn with_retry_notify<T, F, Fut, R>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut on_retry: R,
    mut work: F,
) -> Result<T>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut(u32, &Error),
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt += 1;

        let attempt_token = cancel.child_token();
        let outcome = run_cancellable(cancel, work(attempt_token.clone())).await;
        attempt_token.cancel();

        let error = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Succeeded on attempt {}/{}", attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => e,
        };

        warn!("Attempt {} of {} failed: {}", attempt, max_attempts, error);
        on_retry(attempt, &error);

        if attempt >= max_attempts {
            error!("All {} attempts failed", max_attempts);
            return Err(Error::retries_exhausted(attempt, error));
        }

        let delay = backoff_delay(policy, attempt + 1);
        debug!("Waiting {:?} before attempt {}", delay, attempt + 1);
        sleep(cancel, delay).await?;
    }
}

/// Race `work` against `spec.limit()`.
///
/// `work` receives a child of `cancel`. When the timer wins, that child token
/// is cancelled, the work future is dropped, and the result is
/// [`Error::Timeout`]. Cancelling `cancel` yields [`Error::Cancelled`], never
/// a timeout.
pub async fn with_timeout<T, F, Fut>(
    spec: &TimeoutSpec,
    cancel: &CancellationToken,
    work: F,
) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempt = cancel.child_token();
    let fut = work(attempt.clone());
    race_timeout(spec, cancel, attempt, fut).await
}

/// Like [`with_timeout`], but running out of time is not an error.
///
/// Returns `Ok(None)` when `limit` elapses first (the work token is cancelled
/// and the work dropped), `Ok(Some(value))` on success. Failures of the work
/// and [`Error::Cancelled`] from `cancel` pass through.
pub async fn with_timeout_or_none<T, F, Fut>(
    limit: Duration,
    cancel: &CancellationToken,
    work: F,
) -> Result<Option<T>>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempt = cancel.child_token();
    let fut = work(attempt.clone());
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result.map(Some),
        _ = tokio::time::sleep(limit) => {
            debug!("No result within {:?}", limit);
            Ok(None)
        }
    };
    attempt.cancel();
    outcome
}

/// Retry as the outer wrapper, timeout per attempt as the inner one.
///
/// A slow attempt times out, counts as a failed attempt, and the next one
/// gets a fresh `spec.limit()`.
pub async fn with_retry_and_timeout<T, F, Fut>(
    policy: &RetryPolicy,
    spec: &TimeoutSpec,
    cancel: &CancellationToken,
    mut work: F,
) -> Result<T>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry(policy, cancel, |retry_token| {
        let attempt = retry_token.child_token();
        let fut = work(attempt.clone());
        async move { race_timeout(spec, &retry_token, attempt, fut).await }
    })
    .await
}

/// Await `fut` unless `cancel` fires first
async fn run_cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

async fn race_timeout<T>(
    spec: &TimeoutSpec,
    cancel: &CancellationToken,
    attempt: CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
        _ = tokio::time::sleep(spec.limit()) => {
            warn!("{} after {:?}", spec.error_message(), spec.limit());
            Err(Error::timeout(spec.error_message(), spec.limit()))
        }
    };
    // The attempt is over; anything it started must stop too.
    attempt.cancel();
    outcome
}
