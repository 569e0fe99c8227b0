use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::credential::Browser;
use crate::retry::RetryPolicy;

/// Upper bound on parallel album downloads.
pub const MAX_PARALLEL_DOWNLOADS: usize = 32;

/// Audio formats the storefront offers downloads in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioFormat {
    #[serde(rename = "aac-hi")]
    AacHi,
    #[serde(rename = "aiff-lossless")]
    AiffLossless,
    #[serde(rename = "alac")]
    Alac,
    #[serde(rename = "flac")]
    Flac,
    #[default]
    #[serde(rename = "mp3-320")]
    Mp3_320,
    #[serde(rename = "mp3-v0")]
    Mp3V0,
    #[serde(rename = "vorbis")]
    Vorbis,
    #[serde(rename = "wav")]
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 8] = [
        AudioFormat::AacHi,
        AudioFormat::AiffLossless,
        AudioFormat::Alac,
        AudioFormat::Flac,
        AudioFormat::Mp3_320,
        AudioFormat::Mp3V0,
        AudioFormat::Vorbis,
        AudioFormat::Wav,
    ];

    /// Key of this format in an album's download map.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::AacHi => "aac-hi",
            AudioFormat::AiffLossless => "aiff-lossless",
            AudioFormat::Alac => "alac",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3_320 => "mp3-320",
            AudioFormat::Mp3V0 => "mp3-v0",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown format {:?}", s))
    }
}

/// Default filename template: one directory per artist.
pub fn default_filename_format() -> String {
    format!("{{artist}}{}{{artist}} - {{title}}", std::path::MAIN_SEPARATOR)
}

/// Defaults loaded from `~/.config/bcsync/config.toml`; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BcsyncConfig {
    /// Browser to read storefront cookies from.
    pub browser: Browser,
    /// Audio format to download.
    pub format: AudioFormat,
    /// Filename template, relative to the output directory.
    pub filename_format: String,
    /// Number of albums downloaded at once (1..=32).
    pub parallel_downloads: usize,
    /// Pause after each album, in seconds.
    pub wait_after_download_secs: f64,
    /// Attempts per album before giving up (including the first).
    pub max_download_attempts: u32,
    /// Pause between attempts, in seconds.
    pub retry_wait_secs: f64,
}

impl Default for BcsyncConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Firefox,
            format: AudioFormat::default(),
            filename_format: default_filename_format(),
            parallel_downloads: 5,
            wait_after_download_secs: 1.0,
            max_download_attempts: 5,
            retry_wait_secs: 5.0,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bcsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BcsyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BcsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: BcsyncConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Invalid run settings. Reported before any download starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("--parallel-downloads must be between 1 and {MAX_PARALLEL_DOWNLOADS}, got {0}")]
    ParallelDownloads(usize),
    #[error("--max-download-attempts must be at least 1")]
    MaxAttempts,
    #[error("{flag} must be at least 0, got {value}")]
    NegativeWait { flag: &'static str, value: f64 },
}

/// Everything the writer needs to know about where and how to save albums.
/// Built once per run; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    pub filename_format: String,
    pub file_format: AudioFormat,
    pub force_overwrite: bool,
    pub dry_run: bool,
    /// Pause after each album, to go easy on the storefront.
    pub post_download_wait: Duration,
    /// 0 = quiet; each level adds more per-album detail.
    pub verbosity: u8,
}

/// Unvalidated settings for one run, after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub filename_format: String,
    pub format: AudioFormat,
    pub parallel_downloads: usize,
    pub force: bool,
    pub dry_run: bool,
    pub wait_after_download_secs: f64,
    pub max_download_attempts: u32,
    pub retry_wait_secs: f64,
    pub verbosity: u8,
}

/// Validated settings, ready to hand to the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub download: DownloadConfig,
    pub retry: RetryPolicy,
    pub concurrency: usize,
}

fn non_negative(flag: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(Duration::from_secs_f64(value))
    } else {
        Err(ConfigError::NegativeWait { flag, value })
    }
}

impl Settings {
    /// Checks ranges and builds the immutable run configuration.
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        if !(1..=MAX_PARALLEL_DOWNLOADS).contains(&self.parallel_downloads) {
            return Err(ConfigError::ParallelDownloads(self.parallel_downloads));
        }
        if self.max_download_attempts < 1 {
            return Err(ConfigError::MaxAttempts);
        }
        let post_download_wait = non_negative("--wait-after-download", self.wait_after_download_secs)?;
        let backoff = non_negative("--retry-wait", self.retry_wait_secs)?;

        Ok(RunConfig {
            download: DownloadConfig {
                output_dir: self.output_dir,
                filename_format: self.filename_format,
                file_format: self.format,
                force_overwrite: self.force,
                dry_run: self.dry_run,
                post_download_wait,
                verbosity: self.verbosity,
            },
            retry: RetryPolicy::new(self.max_download_attempts, backoff),
            concurrency: self.parallel_downloads,
        })
    }
}
