//! Integrity-checked album writer.
//!
//! Streams one download to `<output_dir>/<rendered template><extension>`,
//! restarting from byte zero every time. A file counts as complete only when
//! its length matches the server's `Content-Length`; anything shorter is an
//! [`FetchError::IncompleteRead`] for the retry loop to handle.

mod handler;
mod plan;

pub use plan::{destination_path, plan_destination, Plan, Replacing};

use std::sync::Arc;

use crate::config::DownloadConfig;
use crate::credential::Credential;
use crate::http;
use crate::resolver::ResolvedTrack;
use crate::retry::FetchError;
use crate::scheduler::{DownloadOutcome, Reporter};
use crate::url_model::Platform;

use handler::DownloadHandler;

/// Body chunk size requested from libcurl.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Trait implemented by album writers.
pub trait TrackWriter: Send + Sync {
    /// One download attempt. Returns `Skipped` or `Downloaded`; everything else is an error.
    fn write(&self, track: &ResolvedTrack, reporter: &Reporter) -> Result<DownloadOutcome, FetchError>;
}

/// Writer backed by a blocking libcurl transfer.
#[derive(Debug, Clone)]
pub struct CurlTrackWriter {
    config: Arc<DownloadConfig>,
    credential: Arc<Credential>,
    platform: Platform,
}

impl CurlTrackWriter {
    pub fn new(config: Arc<DownloadConfig>, credential: Arc<Credential>) -> Self {
        Self::with_platform(config, credential, Platform::current())
    }

    pub fn with_platform(config: Arc<DownloadConfig>, credential: Arc<Credential>, platform: Platform) -> Self {
        Self {
            config,
            credential,
            platform,
        }
    }
}

impl TrackWriter for CurlTrackWriter {
    fn write(&self, track: &ResolvedTrack, reporter: &Reporter) -> Result<DownloadOutcome, FetchError> {
        let handler = DownloadHandler::new(
            &track.download_url,
            track.track_info.clone(),
            Arc::clone(&self.config),
            self.platform,
            reporter.clone(),
        );
        let mut easy = curl::easy::Easy2::new(handler);
        http::configure(&mut easy, &track.download_url, &self.credential)?;
        easy.get(true)?;
        easy.buffer_size(CHUNK_SIZE)?;

        let performed = easy.perform();
        let result = easy.get_mut().finish(performed);
        if let Err(e) = &result {
            tracing::debug!(url = %track.download_url, error = %e, "download attempt failed");
        }
        result
    }
}
