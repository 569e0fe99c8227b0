//! Fetch error type shared by the resolver and the writer.

use crate::template::TemplateError;

/// Error from one attempt at fetching a page or streaming a download.
///
/// Produced where the failure happens so the retry loop can classify it once
/// (see [`super::classify`]). Variants wrapping another error keep it as the
/// source instead of repeating it in their message.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("transfer failed")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body ended before the declared Content-Length was received.
    #[error("incomplete read: {received} bytes read, {expected} bytes expected")]
    IncompleteRead { expected: u64, received: u64 },
    /// Local disk I/O failed while writing the download.
    #[error("writing to disk failed")]
    Storage(#[source] std::io::Error),
    /// The page has no embedded metadata container.
    #[error("no pagedata metadata found")]
    NoMetadataFound,
    /// The embedded metadata could not be decoded.
    #[error("malformed metadata")]
    MalformedMetadata(#[from] serde_json::Error),
    /// The metadata decoded but lacks something the downloader needs.
    #[error("unexpected metadata: {0}")]
    UnexpectedShape(String),
    /// The download response did not declare its size.
    #[error("response has no Content-Length header; cannot verify size")]
    MissingContentLength,
    /// The filename template could not be rendered for this track.
    #[error("bad filename format")]
    BadFilenameFormat(#[from] TemplateError),
}
