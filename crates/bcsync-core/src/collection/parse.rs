//! Minimal fan profile and collection API structures.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Blob embedded in `https://bandcamp.com/<user>`.
#[derive(Debug, Deserialize)]
pub(super) struct ProfilePage {
    /// Absent when the user does not exist (or has no collection).
    pub collection_count: Option<u64>,
    pub fan_data: Option<FanData>,
    pub collection_data: Option<CollectionData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FanData {
    pub fan_id: u64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CollectionData {
    #[serde(default)]
    pub last_token: Option<String>,
    #[serde(default)]
    pub redownload_urls: BTreeMap<String, String>,
}

/// Response of the collection items API.
#[derive(Debug, Deserialize)]
pub(super) struct CollectionPage {
    #[serde(default)]
    pub redownload_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub more_available: bool,
    #[serde(default)]
    pub last_token: Option<String>,
}
