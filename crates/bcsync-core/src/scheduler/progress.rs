//! Progress reporting for album batches.
//!
//! Workers never print directly: every user-facing line and every counter
//! tick goes through one [`ProgressReporter`], which serializes them so lines
//! from parallel workers do not interleave with each other or with a bar.

use std::fmt::Display;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Sink for batch progress. Implementations must be safe to call from many workers.
pub trait ProgressReporter: Send + Sync {
    /// One more album finished (any outcome).
    fn advance(&self);
    /// Print a full line without corrupting the progress display.
    fn write_line(&self, line: &str);
}

/// Cheap handle passed to workers: the shared reporter plus the verbosity filter.
#[derive(Clone)]
pub struct Reporter {
    progress: Arc<dyn ProgressReporter>,
    verbosity: u8,
}

impl Reporter {
    pub fn new(progress: Arc<dyn ProgressReporter>, verbosity: u8) -> Self {
        Self { progress, verbosity }
    }

    /// Writes `msg` if the run's verbosity is at least `level`.
    pub fn say(&self, level: u8, msg: impl Display) {
        if self.verbosity >= level {
            self.progress.write_line(&msg.to_string());
        }
    }

    /// Writes `msg` regardless of verbosity.
    pub fn line(&self, msg: impl Display) {
        self.progress.write_line(&msg.to_string());
    }

    pub fn advance(&self) {
        self.progress.advance();
    }
}

struct PlainState<W> {
    out: W,
    done: u64,
}

/// Reporter for non-interactive output: writes lines as-is and a
/// `[done/total]` line per finished album.
pub struct PlainReporter<W: Write + Send> {
    total: u64,
    state: Mutex<PlainState<W>>,
}

impl<W: Write + Send> PlainReporter<W> {
    pub fn new(out: W, total: u64) -> Self {
        Self {
            total,
            state: Mutex::new(PlainState { out, done: 0 }),
        }
    }

    /// Albums reported finished so far.
    pub fn done(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).done
    }

    pub fn into_inner(self) -> W {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner).out
    }
}

impl<W: Write + Send> ProgressReporter for PlainReporter<W> {
    fn advance(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.done += 1;
        let done = state.done;
        // Terminal output failures are not worth aborting a batch over.
        let _ = writeln!(state.out, "[{}/{}]", done, self.total);
    }

    fn write_line(&self, line: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(state.out, "{}", line);
    }
}
