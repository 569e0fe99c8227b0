//! Easy2 Handler for one album download.
//! A 2xx header block only counts once the body starts or the transfer ends:
//! a proxy's `200 Connection established` is followed by the real response.
//! The destination is planned at that point; the transfer is then either
//! aborted (skip, dry run) or the body is streamed to disk. Error statuses
//! abort as soon as their headers are in.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::str;
use std::sync::Arc;

use crate::config::DownloadConfig;
use crate::http::{parse_headers, ResponseHead};
use crate::retry::FetchError;
use crate::scheduler::{DownloadOutcome, Reporter};
use crate::template::TrackInfo;
use crate::url_model::Platform;

use super::plan::{plan_destination, Plan, Replacing};

/// Where the transfer stands.
pub(super) enum State {
    /// Body of the final response not reached yet.
    Pending,
    /// Body is being streamed into `file`.
    Writing {
        path: PathBuf,
        expected: u64,
        file: File,
    },
    /// Transfer was aborted on purpose after the headers.
    Stopped(Result<DownloadOutcome, FetchError>),
}

/// Handler state for one download. Implements curl's Handler for Easy2.
pub(super) struct DownloadHandler {
    pub(super) url: String,
    pub(super) track_info: TrackInfo,
    pub(super) config: Arc<DownloadConfig>,
    pub(super) platform: Platform,
    pub(super) reporter: Reporter,
    pub(super) response_headers: Vec<String>,
    /// Last complete 2xx header block; planned from once the body starts.
    pub(super) success_head: Option<ResponseHead>,
    pub(super) state: State,
    pub(super) bytes_written: u64,
    /// Set when a body chunk could not be written; the transfer is aborted.
    pub(super) write_error: Option<std::io::Error>,
}

impl DownloadHandler {
    pub(super) fn new(
        url: &str,
        track_info: TrackInfo,
        config: Arc<DownloadConfig>,
        platform: Platform,
        reporter: Reporter,
    ) -> Self {
        Self {
            url: url.to_string(),
            track_info,
            config,
            platform,
            reporter,
            response_headers: Vec::new(),
            success_head: None,
            state: State::Pending,
            bytes_written: 0,
            write_error: None,
        }
    }

    /// Called on the blank line ending a response's headers. Returns false to abort.
    fn headers_complete(&mut self) -> bool {
        let head = parse_headers(&self.response_headers);
        let Some(status) = head.status else {
            return true;
        };
        if status < 200 {
            return true;
        }
        if head.is_redirect() {
            // curl follows it; track the URL so the fallback filename comes from the final hop.
            if let Some(next) = head
                .location
                .as_deref()
                .and_then(|loc| url::Url::parse(&self.url).ok()?.join(loc).ok())
            {
                self.url = next.to_string();
            }
            return true;
        }
        if !head.is_success() {
            self.state = State::Stopped(Err(FetchError::Http(status)));
            return false;
        }
        self.success_head = Some(head);
        true
    }

    /// Plans the destination from the final response. Returns true if the body
    /// should be written.
    fn begin_body(&mut self) -> bool {
        let Some(head) = self.success_head.take() else {
            return false;
        };
        let plan = match plan_destination(&head, &self.url, &self.track_info, &self.config, self.platform) {
            Ok(plan) => plan,
            Err(e) => {
                self.state = State::Stopped(Err(e));
                return false;
            }
        };
        match plan {
            Plan::Skip(path) => {
                self.reporter.say(3, format!("Skipping album that already exists: [{}]", path.display()));
                self.state = State::Stopped(Ok(DownloadOutcome::Skipped(path)));
                false
            }
            Plan::DryRun {
                path,
                expected,
                replacing,
            } => {
                self.note_replacing(&path, expected, replacing);
                self.reporter.say(2, format!("Dry run: album would be saved to [{}]", path.display()));
                self.state = State::Stopped(Ok(DownloadOutcome::Downloaded(path, expected)));
                false
            }
            Plan::Write {
                path,
                expected,
                replacing,
            } => {
                self.note_replacing(&path, expected, replacing);
                self.reporter.say(2, format!("Album being saved to [{}]", path.display()));
                match create_file(&path) {
                    Ok(file) => {
                        self.state = State::Writing { path, expected, file };
                        true
                    }
                    Err(e) => {
                        self.state = State::Stopped(Err(FetchError::Storage(e)));
                        false
                    }
                }
            }
        }
    }

    fn note_replacing(&self, path: &std::path::Path, expected: u64, replacing: Option<Replacing>) {
        match replacing {
            Some(Replacing::Forced) => self.reporter.say(
                1,
                format!("--force flag was given. Overwriting existing file at [{}].", path.display()),
            ),
            Some(Replacing::WrongSize { on_disk }) => self.reporter.say(
                2,
                format!(
                    "File at [{}] is the wrong size. Expected [{}] but was [{}]. Re-downloading.",
                    path.display(),
                    expected,
                    on_disk
                ),
            ),
            None => {}
        }
    }

    /// Turns the handler's state and curl's result into the download's result.
    pub(super) fn finish(&mut self, performed: Result<(), curl::Error>) -> Result<DownloadOutcome, FetchError> {
        if let Some(e) = self.write_error.take() {
            return Err(FetchError::Storage(e));
        }
        if matches!(self.state, State::Pending) && self.success_head.is_some() {
            // Ended before any body chunk: the body is empty or was cut off.
            if let Err(e) = &performed {
                if !(e.is_partial_file() || e.is_recv_error()) {
                    return Err(FetchError::Curl(e.clone()));
                }
            }
            self.begin_body();
        }
        match std::mem::replace(&mut self.state, State::Pending) {
            State::Stopped(result) => result,
            State::Pending => {
                performed?;
                let head = parse_headers(&self.response_headers);
                Err(FetchError::Http(head.status.unwrap_or(0)))
            }
            State::Writing {
                path,
                expected,
                mut file,
            } => {
                let received = self.bytes_written;
                if let Err(e) = performed {
                    if !(e.is_partial_file() || e.is_recv_error()) {
                        return Err(FetchError::Curl(e));
                    }
                }
                file.flush().map_err(FetchError::Storage)?;
                if received != expected {
                    return Err(FetchError::IncompleteRead { expected, received });
                }
                Ok(DownloadOutcome::Downloaded(path, received))
            }
        }
    }
}

fn create_file(path: &std::path::Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}

impl curl::easy::Handler for DownloadHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.response_headers.clear();
                self.success_head = None;
                self.response_headers.push(line.to_string());
            } else if line.is_empty() {
                return self.headers_complete();
            } else {
                self.response_headers.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if matches!(self.state, State::Pending) && !self.begin_body() {
            return Ok(0);
        }
        let State::Writing { file, .. } = &mut self.state else {
            return Ok(0);
        };
        match file.write_all(data) {
            Ok(()) => {
                self.bytes_written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                tracing::warn!("album write failed: {}", e);
                self.write_error = Some(e);
                Ok(0) // abort transfer
            }
        }
    }
}
