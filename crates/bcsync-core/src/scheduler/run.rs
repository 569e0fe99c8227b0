//! Bounded worker pool over a batch of albums.
//!
//! Keeps up to `concurrency` albums in flight on OS threads pulling from a
//! shared queue; outcomes come back over a channel and are tallied into a
//! [`RunSummary`] on the calling thread.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::collection::AlbumDescriptor;
use crate::resolver::AlbumResolver;
use crate::retry::RetryPolicy;
use crate::writer::TrackWriter;

use super::album::process_album;
use super::outcome::{DownloadOutcome, RunSummary};
use super::progress::Reporter;

/// The two pipeline stages an album goes through.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    pub resolver: &'a dyn AlbumResolver,
    pub writer: &'a dyn TrackWriter,
}

/// Knobs for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Albums in flight at once. 1 runs everything on the calling thread.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Pause after each album (any outcome), once per album.
    pub post_download_wait: Duration,
}

/// Process one album, then report it and pause.
fn finish_album(
    album: &AlbumDescriptor,
    pipeline: &Pipeline<'_>,
    options: &RunOptions,
    reporter: &Reporter,
) -> DownloadOutcome {
    let outcome = process_album(album, pipeline, &options.retry, reporter);
    reporter.advance();
    if !options.post_download_wait.is_zero() {
        std::thread::sleep(options.post_download_wait);
    }
    outcome
}

/// Runs every album in `albums` to a terminal outcome and returns the counts.
/// Per-album failures are reported and counted; they never stop the batch.
pub fn run_albums(
    albums: Vec<AlbumDescriptor>,
    pipeline: &Pipeline<'_>,
    options: &RunOptions,
    reporter: &Reporter,
) -> RunSummary {
    let count = albums.len();
    let mut summary = RunSummary::default();
    tracing::info!(albums = count, concurrency = options.concurrency, "starting album downloads");

    if options.concurrency <= 1 || count <= 1 {
        for album in &albums {
            summary.record(&finish_album(album, pipeline, options, reporter));
        }
    } else {
        let work: Mutex<VecDeque<AlbumDescriptor>> = Mutex::new(albums.into_iter().collect());
        let (tx, rx) = mpsc::channel();
        let num_workers = options.concurrency.min(count);
        std::thread::scope(|s| {
            for _ in 0..num_workers {
                let tx = tx.clone();
                let work = &work;
                s.spawn(move || loop {
                    let next = work.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
                    let Some(album) = next else {
                        break;
                    };
                    let outcome = finish_album(&album, pipeline, options, reporter);
                    if tx.send(outcome).is_err() {
                        break;
                    }
                });
            }
            drop(tx);
            for outcome in rx {
                summary.record(&outcome);
            }
        });
    }

    tracing::info!(
        albums = summary.total(),
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        unavailable = summary.unavailable,
        failed = summary.failed,
        "album downloads finished"
    );
    summary
}
