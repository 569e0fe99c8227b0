//! Per-album outcomes and the run summary built from them.

use std::fmt;
use std::path::PathBuf;

/// Pipeline step an album failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Resolve => "resolve",
            Stage::Download => "download",
        })
    }
}

/// What happened to one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A complete copy was already on disk.
    Skipped(PathBuf),
    /// Written (or, on a dry run, would have been written) with this many bytes.
    Downloaded(PathBuf, u64),
    /// Gave up; `reason` is the full error chain.
    Failed { stage: Stage, reason: String },
    /// The album has nothing to download in the requested format.
    NoDownloadAvailable(String),
}

/// Counters for a finished batch. Outcomes themselves are not kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u64,
    pub skipped: u64,
    pub unavailable: u64,
    pub failed: u64,
    pub bytes: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Downloaded(_, bytes) => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            DownloadOutcome::Failed { .. } => self.failed += 1,
            DownloadOutcome::NoDownloadAvailable(_) => self.unavailable += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.downloaded + self.skipped + self.unavailable + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} without download, {} failed",
            self.downloaded, self.skipped, self.unavailable, self.failed
        )
    }
}
