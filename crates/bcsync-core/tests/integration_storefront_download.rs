//! Integration test: local storefront server, album resolution, integrity-checked
//! downloads, retries and collection paging, driven through the scheduler.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bcsync_core::collection::{list_albums_from, AlbumDescriptor, CollectionError};
use bcsync_core::config::{AudioFormat, DownloadConfig};
use bcsync_core::credential::Credential;
use bcsync_core::resolver::StorefrontResolver;
use bcsync_core::retry::RetryPolicy;
use bcsync_core::scheduler::{run_albums, Pipeline, PlainReporter, Reporter, RunOptions, RunSummary};
use bcsync_core::url_model::Platform;
use bcsync_core::writer::CurlTrackWriter;
use common::storefront_server::{Storefront, StorefrontOptions, ARTIST, FAN};
use tempfile::tempdir;

fn download_config(dir: &Path, format: AudioFormat) -> DownloadConfig {
    DownloadConfig {
        output_dir: dir.to_path_buf(),
        filename_format: "{artist}/{artist} - {title}".into(),
        file_format: format,
        force_overwrite: false,
        dry_run: false,
        post_download_wait: Duration::ZERO,
        verbosity: 0,
    }
}

fn run(config: DownloadConfig, albums: Vec<AlbumDescriptor>, attempts: u32, concurrency: usize) -> RunSummary {
    let credential = Arc::new(Credential::default());
    let resolver = StorefrontResolver::new(config.file_format, Arc::clone(&credential));
    let writer = CurlTrackWriter::with_platform(Arc::new(config), credential, Platform::Permissive);
    let pipeline = Pipeline {
        resolver: &resolver,
        writer: &writer,
    };
    let options = RunOptions {
        concurrency,
        retry: RetryPolicy::new(attempts, Duration::ZERO),
        post_download_wait: Duration::ZERO,
    };
    let reporter = Reporter::new(Arc::new(PlainReporter::new(std::io::sink(), albums.len() as u64)), 3);
    run_albums(albums, &pipeline, &options, &reporter)
}

fn album_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(ARTIST).join(format!("{} - {}.zip", ARTIST, title))
}

#[test]
fn download_completes_and_second_run_skips() {
    let server = Storefront::start(StorefrontOptions::default());
    let dir = tempdir().unwrap();
    let albums = vec![AlbumDescriptor::new(server.album_url("one"))];

    let summary = run(download_config(dir.path(), AudioFormat::Flac), albums.clone(), 3, 1);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.bytes, 1000);
    let path = album_path(dir.path(), "one");
    let content = std::fs::read(&path).unwrap();
    assert_eq!(content, StorefrontOptions::default().body);

    let summary = run(download_config(dir.path(), AudioFormat::Flac), albums, 3, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
}

#[test]
fn empty_album_download_is_skipped_on_second_run() {
    let server = Storefront::start(StorefrontOptions {
        body: Vec::new(),
        ..StorefrontOptions::default()
    });
    let dir = tempdir().unwrap();
    let albums = vec![AlbumDescriptor::new(server.album_url("silence"))];

    let summary = run(download_config(dir.path(), AudioFormat::Flac), albums.clone(), 1, 1);
    assert_eq!(summary.downloaded, 1);
    let path = album_path(dir.path(), "silence");
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

    let summary = run(download_config(dir.path(), AudioFormat::Flac), albums, 1, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn wrong_size_file_is_replaced() {
    let server = Storefront::start(StorefrontOptions::default());
    let dir = tempdir().unwrap();
    let path = album_path(dir.path(), "one");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"stale").unwrap();

    let summary = run(
        download_config(dir.path(), AudioFormat::Flac),
        vec![AlbumDescriptor::new(server.album_url("one"))],
        1,
        1,
    );
    assert_eq!(summary.downloaded, 1);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
}

#[test]
fn truncated_body_is_retried_until_complete() {
    let server = Storefront::start(StorefrontOptions {
        truncated_downloads: 2,
        ..Default::default()
    });
    let dir = tempdir().unwrap();

    let summary = run(
        download_config(dir.path(), AudioFormat::Flac),
        vec![AlbumDescriptor::new(server.album_url("one"))],
        3,
        1,
    );

    assert_eq!(summary.downloaded, 1);
    assert_eq!(server.hits("/download/one"), 3);
    // The album page is resolved once; only the download is retried.
    assert_eq!(server.hits("/album/one"), 1);
    assert_eq!(std::fs::metadata(album_path(dir.path(), "one")).unwrap().len(), 1000);
}

#[test]
fn truncated_body_exhausts_attempts_and_leaves_partial_file() {
    let server = Storefront::start(StorefrontOptions {
        truncated_downloads: usize::MAX,
        ..Default::default()
    });
    let dir = tempdir().unwrap();

    let summary = run(
        download_config(dir.path(), AudioFormat::Flac),
        vec![AlbumDescriptor::new(server.album_url("one"))],
        2,
        1,
    );

    assert_eq!(summary.failed, 1);
    assert_eq!(server.hits("/download/one"), 2);
    assert_eq!(std::fs::metadata(album_path(dir.path(), "one")).unwrap().len(), 500);
}

#[test]
fn dry_run_creates_nothing() {
    let server = Storefront::start(StorefrontOptions::default());
    let dir = tempdir().unwrap();
    let config = DownloadConfig {
        dry_run: true,
        ..download_config(dir.path(), AudioFormat::Flac)
    };

    let summary = run(config, vec![AlbumDescriptor::new(server.album_url("one"))], 3, 1);

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.bytes, 1000);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn format_not_offered_opens_no_download() {
    let server = Storefront::start(StorefrontOptions {
        formats: vec!["mp3-320"],
        ..Default::default()
    });
    let dir = tempdir().unwrap();

    let summary = run(
        download_config(dir.path(), AudioFormat::Flac),
        vec![AlbumDescriptor::new(server.album_url("one"))],
        3,
        1,
    );

    assert_eq!(summary.unavailable, 1);
    assert_eq!(server.hits("/download/"), 0);
}

#[test]
fn missing_album_page_fails_only_that_album() {
    let server = Storefront::start(StorefrontOptions::default());
    let dir = tempdir().unwrap();
    let albums = vec![
        AlbumDescriptor::new(server.album_url("one")),
        AlbumDescriptor::new(format!("{}/nowhere/at/all", server.base())),
        AlbumDescriptor::new(server.album_url("two")),
    ];

    let summary = run(download_config(dir.path(), AudioFormat::Flac), albums, 2, 2);

    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 1);
    // 404 is transient: both attempts were made.
    assert_eq!(server.hits("/nowhere"), 2);
}

#[test]
fn collection_is_paged_then_downloaded() {
    let names: Vec<String> = ["a1", "b2", "c3", "d4", "e5"].iter().map(|s| s.to_string()).collect();
    let server = Storefront::start(StorefrontOptions {
        collection: names.clone(),
        ..Default::default()
    });
    let dir = tempdir().unwrap();

    let albums = list_albums_from(server.base(), FAN, &Credential::default()).unwrap();
    let mut urls: Vec<_> = albums.iter().map(|a| a.url.clone()).collect();
    urls.sort();
    let expected: Vec<_> = names.iter().map(|n| server.album_url(n)).collect();
    assert_eq!(urls, expected);
    // Profile page holds 2 links; the remaining 3 come in pages of 2.
    assert_eq!(server.hits("/api/fancollection/1/collection_items"), 2);

    let summary = run(download_config(dir.path(), AudioFormat::Mp3_320), albums, 2, 3);
    assert_eq!(summary.downloaded, 5);
    for name in &names {
        assert!(album_path(dir.path(), name).is_file(), "{} missing", name);
    }
}

#[test]
fn unknown_user_is_reported() {
    let server = Storefront::start(StorefrontOptions::default());
    let err = list_albums_from(server.base(), "nobody", &Credential::default()).unwrap_err();
    assert!(matches!(err, CollectionError::UserNotFound(u) if u == "nobody"));
}
