//! Album batch scheduler.
//!
//! Coordinates the download pipeline for a whole collection:
//! resolver → writer, each under the shared retry policy, with a bounded
//! number of albums in flight. One album's failure never stops the others.

mod album;
mod outcome;
mod progress;
mod run;

pub use album::error_chain;
pub use outcome::{DownloadOutcome, RunSummary, Stage};
pub use progress::{PlainReporter, ProgressReporter, Reporter};
pub use run::{run_albums, Pipeline, RunOptions};
