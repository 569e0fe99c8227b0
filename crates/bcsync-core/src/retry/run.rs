//! Retry loop: run a closure until success or policy says stop.

use std::time::Duration;

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Successful result plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Terminal failure of a retried operation.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Every attempt failed with a transient error; `last` is the final one.
    #[error("gave up after {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        #[source]
        last: FetchError,
    },
    /// A structural failure; returned on the attempt it occurred.
    #[error(transparent)]
    NotRetryable(FetchError),
}

impl RetryError {
    /// The underlying fetch error.
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::NotRetryable(e) => e,
        }
    }
}

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On a transient failure, calls `on_retry(attempt, &err)`, sleeps for the
/// backoff duration, then tries again.
pub fn run_with_retry<T, F, N>(policy: &RetryPolicy, on_retry: N, f: F) -> Result<Attempted<T>, RetryError>
where
    F: FnMut() -> Result<T, FetchError>,
    N: FnMut(u32, &FetchError),
{
    run_with_retry_sleeping(policy, std::thread::sleep, on_retry, f)
}

/// [`run_with_retry`] with an injectable sleep function.
pub fn run_with_retry_sleeping<T, F, N, S>(
    policy: &RetryPolicy,
    mut sleep: S,
    mut on_retry: N,
    mut f: F,
) -> Result<Attempted<T>, RetryError>
where
    F: FnMut() -> Result<T, FetchError>,
    N: FnMut(u32, &FetchError),
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(value) => {
                return Ok(Attempted {
                    value,
                    attempts: attempt,
                })
            }
            Err(e) => match policy.decide(attempt, classify::classify(&e)) {
                RetryDecision::NotRetryable => return Err(RetryError::NotRetryable(e)),
                RetryDecision::Exhausted => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    })
                }
                RetryDecision::RetryAfter(d) => {
                    on_retry(attempt, &e);
                    sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
