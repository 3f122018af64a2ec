//! Bounded retry with exponential backoff, shared by both operations.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RetryPolicy;
use crate::error::{BackendError, ResponseTypeError};
use crate::interpret::Rejection;

/// Deterministic capped exponential schedule.
///
/// The n-th call to `next_backoff` yields `min(base * 2^(n-1), max)`. There
/// is no jitter and no elapsed-time limit; the caller bounds the attempts.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    base: Duration,
    max: Duration,
    issued: u32,
}

impl BackoffSchedule {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            base: policy.backoff_base(),
            max: policy.backoff_max(),
            issued: 0,
        }
    }

    /// Delay following the rejection of attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.base;
        for _ in 1..attempt {
            if delay >= self.max {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        delay.min(self.max)
    }
}

impl Backoff for BackoffSchedule {
    fn reset(&mut self) {
        self.issued = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.issued = self.issued.saturating_add(1);
        Some(self.delay_for(self.issued))
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted,
    Rejected(Rejection),
    TransportError,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Accepted => f.write_str("accepted"),
            AttemptOutcome::Rejected(rejection) => f.write_str(rejection.as_str()),
            AttemptOutcome::TransportError => f.write_str("API error"),
        }
    }
}

/// What happened on one attempt. Only lives long enough to be logged.
#[derive(Debug)]
pub struct AttemptRecord<'a> {
    pub index: u32,
    pub elapsed: Duration,
    pub response: Option<&'a str>,
    pub outcome: AttemptOutcome,
}

impl AttemptRecord<'_> {
    fn log(&self, total: u32) {
        match self.response {
            Some(text) => debug!(
                "[Attempt {}/{}] Response ({} ms, {}): {:?}",
                self.index,
                total,
                self.elapsed.as_millis(),
                self.outcome,
                text
            ),
            None => debug!(
                "[Attempt {}/{}] No response ({} ms, {})",
                self.index,
                total,
                self.elapsed.as_millis(),
                self.outcome
            ),
        }
    }
}

/// Run round trips until one is accepted or the policy's attempts run out.
///
/// `round_trip` performs one exchange with the backend. Its text is handed to
/// `interpret`; the first accepted value is returned immediately. Backend
/// errors and rejected text are treated the same way: the attempt counts as
/// rejected and, unless it was the last one, the task sleeps for the next
/// backoff delay. Exhaustion yields a single [`ResponseTypeError`] naming
/// `expected`.
pub async fn run_with_retry<T, R, Fut, I>(
    policy: &RetryPolicy,
    expected: &str,
    payload: &str,
    mut round_trip: R,
    interpret: I,
) -> Result<T, ResponseTypeError>
where
    R: FnMut() -> Fut,
    Fut: Future<Output = Result<String, BackendError>>,
    I: Fn(&str) -> Result<T, Rejection>,
{
    let total = policy.max_attempts();
    let mut backoff = BackoffSchedule::new(policy);

    for attempt in 1..=total {
        debug!("[Attempt {}/{}] {}", attempt, total, payload);

        let started = Instant::now();
        let result = round_trip().await;
        let elapsed = started.elapsed();

        let outcome = match &result {
            Ok(text) => {
                let verdict = interpret(text.as_str());
                let outcome = match &verdict {
                    Ok(_) => AttemptOutcome::Accepted,
                    Err(rejection) => AttemptOutcome::Rejected(*rejection),
                };
                AttemptRecord {
                    index: attempt,
                    elapsed,
                    response: Some(text.as_str()),
                    outcome,
                }
                .log(total);

                if let Ok(value) = verdict {
                    return Ok(value);
                }
                outcome
            }
            Err(e) => {
                debug!("API error on attempt {}: {}", attempt, e);
                AttemptRecord {
                    index: attempt,
                    elapsed,
                    response: None,
                    outcome: AttemptOutcome::TransportError,
                }
                .log(total);
                AttemptOutcome::TransportError
            }
        };

        if attempt < total
            && let Some(delay) = backoff.next_backoff()
        {
            debug!(
                "Backing off for {:.2}s before retry ({})",
                delay.as_secs_f64(),
                outcome
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(ResponseTypeError {
        expected: expected.to_string(),
        attempts: total,
    })
}
