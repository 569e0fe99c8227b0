//! Album resolution: album page URL to a concrete download URL.
//!
//! The orchestrator only depends on the [`AlbumResolver`] trait; the
//! storefront implementation fetches the page and reads its embedded
//! metadata blob.

mod parse;

use std::sync::Arc;

use crate::config::AudioFormat;
use crate::credential::Credential;
use crate::http;
use crate::pagedata;
use crate::retry::FetchError;
use crate::template::{TrackInfo, TrackValue, TRACK_INFO_KEYS};

use parse::AlbumPage;

/// Everything the writer needs to fetch one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub download_url: String,
    pub track_info: TrackInfo,
    pub album_title: String,
}

/// Result of resolving an album page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Ready(ResolvedTrack),
    /// The album cannot be downloaded in the requested form; not an error.
    Unavailable(String),
}

pub const NO_DOWNLOADS: &str = "no downloads";
pub const FORMAT_NOT_OFFERED: &str = "format not offered";

/// Trait implemented by album resolvers.
pub trait AlbumResolver: Send + Sync {
    fn resolve(&self, album_url: &str) -> Result<Resolution, FetchError>;
}

/// Resolves albums by fetching their storefront download page.
#[derive(Debug, Clone)]
pub struct StorefrontResolver {
    format: AudioFormat,
    credential: Arc<Credential>,
}

impl StorefrontResolver {
    pub fn new(format: AudioFormat, credential: Arc<Credential>) -> Self {
        Self { format, credential }
    }
}

impl AlbumResolver for StorefrontResolver {
    fn resolve(&self, album_url: &str) -> Result<Resolution, FetchError> {
        let html = http::get_text(album_url, &self.credential)?;
        resolve_page(&html, self.format.as_str())
    }
}

/// Picks the download for `format` out of an album page.
pub fn resolve_page(html: &str, format: &str) -> Result<Resolution, FetchError> {
    let page: AlbumPage = pagedata::parse_blob(html)?;
    let item = page
        .download_items
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::UnexpectedShape("download_items is empty".into()))?;

    let Some(mut downloads) = item.downloads else {
        return Ok(Resolution::Unavailable(NO_DOWNLOADS.into()));
    };
    let Some(link) = downloads.remove(format) else {
        return Ok(Resolution::Unavailable(FORMAT_NOT_OFFERED.into()));
    };

    let [item_id, artist, title] = TRACK_INFO_KEYS;
    let mut track_info = TrackInfo::new();
    track_info.insert(item_id.into(), item.item_id);
    track_info.insert(artist.into(), TrackValue::Text(item.artist));
    track_info.insert(title.into(), TrackValue::Text(item.title.clone()));

    Ok(Resolution::Ready(ResolvedTrack {
        download_url: link.url,
        track_info,
        album_title: item.title,
    }))
}
