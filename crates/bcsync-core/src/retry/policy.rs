use std::time::Duration;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Network-level failure (connection reset, DNS, truncated transfer, etc.).
    Connection,
    /// Non-2xx HTTP status.
    Http(u16),
    /// Fewer bytes arrived than the server declared.
    IncompleteRead,
    /// Local I/O failure while writing.
    Io,
    /// Unexpected data shape (missing metadata, bad template, ...). Never retried.
    Structural,
}

impl ErrorKind {
    /// True for failures that are likely temporary and worth another attempt.
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::Structural)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Transient failure, but every attempt has been used.
    Exhausted,
    /// The failure is structural; retrying would not help.
    NotRetryable,
}

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). At least 1.
    pub max_attempts: u32,
    /// Pause between attempts; the same every time.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Decide what to do after `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_transient() {
            return RetryDecision::NotRetryable;
        }
        if attempt >= self.max_attempts {
            return RetryDecision::Exhausted;
        }
        RetryDecision::RetryAfter(self.backoff)
    }
}
