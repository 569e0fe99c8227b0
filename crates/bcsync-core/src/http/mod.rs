//! HTTP helpers on top of libcurl (via the `curl` crate).
//!
//! Page fetches and API posts buffer the whole body; downloads stream through
//! their own `Easy2` handler in [`crate::writer`]. Everything here blocks the
//! current thread; call from `spawn_blocking` if used from async code.

mod parse;

pub(crate) use parse::{parse_headers, parse_status_line};

use std::time::Duration;

use crate::credential::Credential;
use crate::retry::FetchError;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("bcsync/", env!("CARGO_PKG_VERSION"));

/// Key headers of one HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
    pub location: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }

    /// A 3xx that curl is about to follow.
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, Some(300..=399)) && self.location.is_some()
    }
}

/// Applies the shared request options: URL, redirects, timeouts, cookies.
pub(crate) fn configure<H: curl::easy::Handler>(
    easy: &mut curl::easy::Easy2<H>,
    url: &str,
    credential: &Credential,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    // Abort if throughput drops below 1 KiB/s for 60s rather than using a hard wall-clock limit.
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    if let Some(cookies) = credential.cookie_header_for(url) {
        easy.cookie(&cookies)?;
    }
    Ok(())
}

/// Collects the response body in memory.
#[derive(Default)]
struct Collector {
    body: Vec<u8>,
}

impl curl::easy::Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}

fn perform(mut easy: curl::easy::Easy2<Collector>, url: &str) -> Result<String, FetchError> {
    easy.perform()?;
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        tracing::debug!(url, code, "request returned non-success status");
        return Err(FetchError::Http(code));
    }
    let body = std::mem::take(&mut easy.get_mut().body);
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// GET `url` and return the body as text.
pub fn get_text(url: &str, credential: &Credential) -> Result<String, FetchError> {
    let mut easy = curl::easy::Easy2::new(Collector::default());
    configure(&mut easy, url, credential)?;
    easy.get(true)?;
    perform(easy, url)
}

/// POST a JSON document to `url` and return the response body as text.
pub fn post_json(url: &str, json: &str, credential: &Credential) -> Result<String, FetchError> {
    let mut easy = curl::easy::Easy2::new(Collector::default());
    configure(&mut easy, url, credential)?;
    easy.post(true)?;
    easy.post_fields_copy(json.as_bytes())?;
    let mut list = curl::easy::List::new();
    list.append("Content-Type: application/json")?;
    easy.http_headers(list)?;
    perform(easy, url)
}
