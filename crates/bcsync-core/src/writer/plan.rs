//! Destination planning: decides what to do with a download once its headers are in.

use std::path::{Path, PathBuf};

use crate::config::DownloadConfig;
use crate::http::ResponseHead;
use crate::retry::FetchError;
use crate::template::{render, sanitize_track_info, TrackInfo};
use crate::url_model::{extension_of, suggested_filename, Platform};

/// Why an existing file is about to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacing {
    Forced,
    WrongSize { on_disk: u64 },
}

/// Decision for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// A file of the expected size already exists.
    Skip(PathBuf),
    /// Dry run: report the destination, touch nothing.
    DryRun {
        path: PathBuf,
        expected: u64,
        replacing: Option<Replacing>,
    },
    Write {
        path: PathBuf,
        expected: u64,
        replacing: Option<Replacing>,
    },
}

/// `<output_dir>/<rendered template><extension of the suggested filename>`.
pub fn destination_path(
    output_dir: &Path,
    filename_format: &str,
    track_info: &TrackInfo,
    suggested: Option<&str>,
    platform: Platform,
) -> Result<PathBuf, FetchError> {
    let rendered = render(filename_format, &sanitize_track_info(track_info, platform))?;
    let ext = suggested.map(extension_of).unwrap_or_default();
    Ok(output_dir.join(format!("{}{}", rendered, ext)))
}

/// Plans the download described by `head`, fetched from `url` (after redirects).
pub fn plan_destination(
    head: &ResponseHead,
    url: &str,
    track_info: &TrackInfo,
    config: &DownloadConfig,
    platform: Platform,
) -> Result<Plan, FetchError> {
    let expected = head.content_length.ok_or(FetchError::MissingContentLength)?;
    let suggested = suggested_filename(url, head.content_disposition.as_deref());
    let path = destination_path(
        &config.output_dir,
        &config.filename_format,
        track_info,
        suggested.as_deref(),
        platform,
    )?;

    let on_disk = std::fs::metadata(&path).ok().filter(|m| m.is_file()).map(|m| m.len());
    let replacing = match on_disk {
        None => None,
        Some(_) if config.force_overwrite => Some(Replacing::Forced),
        Some(len) if len == expected => return Ok(Plan::Skip(path)),
        Some(len) => Some(Replacing::WrongSize { on_disk: len }),
    };

    if config.dry_run {
        return Ok(Plan::DryRun {
            path,
            expected,
            replacing,
        });
    }
    Ok(Plan::Write {
        path,
        expected,
        replacing,
    })
}
