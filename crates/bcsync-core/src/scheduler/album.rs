//! One album through the pipeline: resolve, then write, each under the retry loop.

use std::error::Error;

use crate::collection::AlbumDescriptor;
use crate::resolver::Resolution;
use crate::retry::{classify, run_with_retry, FetchError, RetryError, RetryPolicy};

use super::outcome::{DownloadOutcome, Stage};
use super::progress::Reporter;
use super::run::Pipeline;

/// `err` followed by each of its sources, separated by `": "`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn note_retry(reporter: &Reporter, album: &AlbumDescriptor, stage: Stage, attempt: u32, err: &FetchError) {
    let chain = error_chain(err);
    tracing::warn!(url = %album.url, %stage, attempt, error = %chain, "attempt failed; retrying");
    reporter.say(
        2,
        format!(
            "WARN: {} error on attempt # [{}] for album url [{}]: {}. Trying again...",
            stage, attempt, album.url, chain
        ),
    );
}

fn failed(reporter: &Reporter, album: &AlbumDescriptor, stage: Stage, err: RetryError) -> DownloadOutcome {
    let reason = error_chain(&err);
    let kind = classify(err.fetch_error());
    tracing::error!(url = %album.url, %stage, ?kind, error = %reason, "album failed");
    reporter.line(format!(
        "ERROR: Unable to download album url [{}] ({}): {}",
        album.url, stage, reason
    ));
    DownloadOutcome::Failed { stage, reason }
}

/// Runs one album to a terminal outcome. Never panics on album errors and
/// never returns them; failures become [`DownloadOutcome::Failed`].
pub(super) fn process_album(
    album: &AlbumDescriptor,
    pipeline: &Pipeline<'_>,
    retry: &RetryPolicy,
    reporter: &Reporter,
) -> DownloadOutcome {
    tracing::debug!(url = %album.url, "resolving album");
    let resolved = run_with_retry(
        retry,
        |attempt, e| note_retry(reporter, album, Stage::Resolve, attempt, e),
        || pipeline.resolver.resolve(&album.url),
    );
    let track = match resolved {
        Ok(attempted) => match attempted.value {
            Resolution::Ready(track) => track,
            Resolution::Unavailable(reason) => {
                tracing::info!(url = %album.url, %reason, "no download available");
                reporter.say(1, format!("No download available for album url [{}]: {}", album.url, reason));
                return DownloadOutcome::NoDownloadAvailable(reason);
            }
        },
        Err(e) => return failed(reporter, album, Stage::Resolve, e),
    };

    tracing::debug!(url = %album.url, title = %track.album_title, "downloading album");
    let written = run_with_retry(
        retry,
        |attempt, e| note_retry(reporter, album, Stage::Download, attempt, e),
        || pipeline.writer.write(&track, reporter),
    );
    match written {
        Ok(attempted) => {
            tracing::debug!(url = %album.url, attempts = attempted.attempts, outcome = ?attempted.value, "album finished");
            attempted.value
        }
        Err(e) => failed(reporter, album, Stage::Download, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_includes_sources() {
        let err = RetryError::Exhausted {
            attempts: 3,
            last: FetchError::Curl(curl::Error::new(7)),
        };
        let chain = error_chain(&err);
        assert!(chain.starts_with("gave up after 3 attempt(s): transfer failed: "), "{}", chain);

        let err = RetryError::NotRetryable(FetchError::NoMetadataFound);
        assert_eq!(error_chain(&err), "no pagedata metadata found");
    }
}
