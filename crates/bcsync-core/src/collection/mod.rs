//! Collection listing: username to the album pages the fan can re-download.
//!
//! The profile page embeds the first batch of re-download links plus a paging
//! token; the rest comes from the collection items API, one POST per page.

mod parse;

use std::collections::HashSet;

use crate::credential::Credential;
use crate::http;
use crate::pagedata;
use crate::retry::FetchError;

use parse::{CollectionPage, ProfilePage};

/// Storefront root the collection is read from.
pub const STOREFRONT_URL: &str = "https://bandcamp.com";

/// Path of the paginated collection API, relative to the storefront root.
pub const COLLECTION_ITEMS_PATH: &str = "/api/fancollection/1/collection_items";

/// One album to download: its re-download page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumDescriptor {
    pub url: String,
}

impl AlbumDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("no collection info for user [{0}]; give the username exactly as it appears at the end of bandcamp.com/<username>")]
    UserNotFound(String),
    #[error("could not fetch the collection of [{user}]")]
    Network {
        user: String,
        #[source]
        source: FetchError,
    },
    #[error("unexpected collection data for [{user}]: {reason}")]
    Malformed { user: String, reason: String },
}

/// Lists every album in `user`'s collection on the public storefront.
pub fn list_albums(user: &str, credential: &Credential) -> Result<Vec<AlbumDescriptor>, CollectionError> {
    list_albums_from(STOREFRONT_URL, user, credential)
}

/// [`list_albums`] against an arbitrary storefront root.
pub fn list_albums_from(
    base_url: &str,
    user: &str,
    credential: &Credential,
) -> Result<Vec<AlbumDescriptor>, CollectionError> {
    let base_url = base_url.trim_end_matches('/');
    let profile_url = format!("{}/{}", base_url, user);
    tracing::info!(user, url = %profile_url, "retrieving collection");

    let html = http::get_text(&profile_url, credential).map_err(|e| match e {
        FetchError::Http(404) => CollectionError::UserNotFound(user.to_string()),
        e => network(user, e),
    })?;
    let profile: ProfilePage = pagedata::parse_blob(&html).map_err(|e| match e {
        FetchError::NoMetadataFound => CollectionError::UserNotFound(user.to_string()),
        e => malformed(user, e.to_string()),
    })?;
    let first = first_batch(user, profile)?;

    let mut collector = Collector::new(first.count);
    collector.extend(first.urls);
    let items_url = format!("{}{}", base_url, COLLECTION_ITEMS_PATH);
    let mut token = first.last_token;

    while let Some(older_than) = token.take() {
        let Some(remaining) = collector.remaining() else {
            break;
        };
        let payload = serde_json::json!({
            "fan_id": first.fan_id,
            "count": remaining,
            "older_than_token": older_than,
        });
        tracing::debug!(user, remaining, "requesting collection page");
        let body = http::post_json(&items_url, &payload.to_string(), credential).map_err(|e| network(user, e))?;
        let page: CollectionPage = serde_json::from_str(&body).map_err(|e| malformed(user, e.to_string()))?;

        let added = collector.extend(page.redownload_urls.into_values());
        if page.more_available && added > 0 {
            token = page.last_token;
        }
    }

    let albums = collector.finish();
    tracing::info!(user, albums = albums.len(), "collection retrieved");
    Ok(albums)
}

fn network(user: &str, source: FetchError) -> CollectionError {
    CollectionError::Network {
        user: user.to_string(),
        source,
    }
}

fn malformed(user: &str, reason: String) -> CollectionError {
    CollectionError::Malformed {
        user: user.to_string(),
        reason,
    }
}

/// What the profile page contributes before paging starts.
struct FirstBatch {
    count: u64,
    fan_id: u64,
    last_token: Option<String>,
    urls: Vec<String>,
}

fn first_batch(user: &str, profile: ProfilePage) -> Result<FirstBatch, CollectionError> {
    let count = profile
        .collection_count
        .ok_or_else(|| CollectionError::UserNotFound(user.to_string()))?;
    let fan_id = profile
        .fan_data
        .ok_or_else(|| malformed(user, "missing fan_data".into()))?
        .fan_id;
    let data = profile
        .collection_data
        .ok_or_else(|| malformed(user, "missing collection_data".into()))?;
    Ok(FirstBatch {
        count,
        fan_id,
        last_token: data.last_token,
        urls: data.redownload_urls.into_values().collect(),
    })
}

/// Accumulates album URLs in order, dropping duplicates.
struct Collector {
    expected: u64,
    seen: HashSet<String>,
    albums: Vec<AlbumDescriptor>,
}

impl Collector {
    fn new(expected: u64) -> Self {
        Self {
            expected,
            seen: HashSet::new(),
            albums: Vec::new(),
        }
    }

    /// Adds `urls`; returns how many were new.
    fn extend(&mut self, urls: impl IntoIterator<Item = String>) -> usize {
        let before = self.albums.len();
        for url in urls {
            if self.seen.insert(url.clone()) {
                self.albums.push(AlbumDescriptor::new(url));
            }
        }
        self.albums.len() - before
    }

    /// Albums still missing, or None when the collection is complete.
    fn remaining(&self) -> Option<u64> {
        let have = self.albums.len() as u64;
        (have < self.expected).then(|| self.expected - have)
    }

    fn finish(self) -> Vec<AlbumDescriptor> {
        self.albums
    }
}
