//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, HTTP failures,
//! truncated transfers versus structural problems) and the fixed-interval
//! retry loop so that the resolver and the writer share one policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, run_with_retry_sleeping, Attempted, RetryError};
