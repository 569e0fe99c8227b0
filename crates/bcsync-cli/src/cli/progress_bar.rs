//! Terminal progress bar for album batches.

use bcsync_core::scheduler::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_STYLE: &str = "[{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} albums ({eta})";

const BAR_CHARS: &str = "█▓▒░  ";

/// `ProgressReporter` backed by an indicatif bar. Lines are printed above the
/// bar so messages from parallel workers never tear it.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        let style = match ProgressStyle::with_template(BAR_STYLE) {
            Ok(style) => style.progress_chars(BAR_CHARS),
            Err(_) => ProgressStyle::default_bar(),
        };
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl ProgressReporter for BarReporter {
    fn advance(&self) {
        self.bar.inc(1);
    }

    fn write_line(&self, line: &str) {
        self.bar.println(line);
    }
}
