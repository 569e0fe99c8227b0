//! Minimal album page structures: only the fields the downloader consumes.

use std::collections::HashMap;

use serde::Deserialize;

use crate::template::TrackValue;

#[derive(Debug, Deserialize)]
pub(super) struct AlbumPage {
    pub download_items: Vec<DownloadItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DownloadItem {
    pub title: String,
    pub item_id: TrackValue,
    pub artist: String,
    #[serde(default)]
    pub downloads: Option<HashMap<String, DownloadLink>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DownloadLink {
    pub url: String,
}
