//! CLI for the bcsync collection downloader.

mod progress_bar;

use anyhow::{Context, Result};
use bcsync_core::collection::{self, CollectionError};
use bcsync_core::config::{self, AudioFormat, BcsyncConfig, ConfigError, RunConfig, Settings};
use bcsync_core::credential::{self, Browser, CredentialSource};
use bcsync_core::resolver::StorefrontResolver;
use bcsync_core::scheduler::{self, Pipeline, PlainReporter, ProgressReporter, Reporter, RunOptions};
use bcsync_core::writer::CurlTrackWriter;
use clap::{ArgAction, Parser};
use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use progress_bar::BarReporter;

/// Download your collection from bandcamp. Requires a logged in session in a
/// supported browser, or an exported cookies.txt file.
#[derive(Debug, Parser)]
#[command(name = "bcsync", version)]
#[command(about = "Download your purchased Bandcamp collection", long_about = None)]
pub struct Cli {
    /// Your bandcamp username, as it appears at the end of your collection url (bandcamp.com/<username>).
    pub username: String,

    /// Browser to take bandcamp cookies from: firefox, chrome, chromium, brave, opera or edge.
    #[arg(short, long)]
    pub browser: Option<Browser>,

    /// Netscape cookies.txt file to take bandcamp cookies from instead of a browser.
    #[arg(long, value_name = "PATH", conflicts_with = "browser")]
    pub cookies: Option<PathBuf>,

    /// Base location of where to download the files (default: current directory).
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Filename template; available fields are {item_id}, {artist} and {title}.
    #[arg(long, value_name = "FORMAT")]
    pub filename_format: Option<String>,

    /// Audio format: aac-hi, aiff-lossless, alac, flac, mp3-320, mp3-v0, vorbis or wav.
    #[arg(short, long)]
    pub format: Option<AudioFormat>,

    /// Albums to download at once (1-32).
    #[arg(short, long, value_name = "N")]
    pub parallel_downloads: Option<usize>,

    /// Always re-download existing albums, even if they are complete.
    #[arg(long)]
    pub force: bool,

    /// Don't download anything, only print what would be downloaded.
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait after each album download.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub wait_after_download: Option<f64>,

    /// Attempts per album before giving up.
    #[arg(long, value_name = "N")]
    pub max_download_attempts: Option<u32>,

    /// Seconds to wait between attempts.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub retry_wait: Option<f64>,

    /// More output; repeat for more detail (-vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// The user's collection came back empty.
#[derive(Debug)]
pub struct NoAlbumsFound {
    pub user: String,
}

impl fmt::Display for NoAlbumsFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no album links found for user [{}]. Are you logged in and have you selected the correct browser to pull cookies from?",
            self.user
        )
    }
}

impl std::error::Error for NoAlbumsFound {}

/// Process exit code for a fatal error: 2 for bad arguments or an empty or
/// unknown collection, 1 for everything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<NoAlbumsFound>().is_some() {
        return 2;
    }
    match err.downcast_ref::<CollectionError>() {
        Some(CollectionError::UserNotFound(_)) => 2,
        _ => 1,
    }
}

impl Cli {
    /// Merges flags over the config file defaults.
    pub fn settings(&self, cfg: &BcsyncConfig, cwd: PathBuf) -> Settings {
        Settings {
            output_dir: self.directory.clone().unwrap_or(cwd),
            filename_format: self
                .filename_format
                .clone()
                .unwrap_or_else(|| cfg.filename_format.clone()),
            format: self.format.unwrap_or(cfg.format),
            parallel_downloads: self.parallel_downloads.unwrap_or(cfg.parallel_downloads),
            force: self.force,
            dry_run: self.dry_run,
            wait_after_download_secs: self.wait_after_download.unwrap_or(cfg.wait_after_download_secs),
            max_download_attempts: self.max_download_attempts.unwrap_or(cfg.max_download_attempts),
            retry_wait_secs: self.retry_wait.unwrap_or(cfg.retry_wait_secs),
            verbosity: self.verbose,
        }
    }

    pub fn credential_source(&self, cfg: &BcsyncConfig) -> CredentialSource {
        match &self.cookies {
            Some(path) => CredentialSource::CookieFile(path.clone()),
            None => CredentialSource::Browser(self.browser.unwrap_or(cfg.browser)),
        }
    }

    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init().context("failed to load config file")?;
        tracing::debug!("loaded config: {:?}", cfg);
        let cwd = std::env::current_dir()?;
        let run_cfg = self.settings(&cfg, cwd).validate()?;
        let verbosity = run_cfg.download.verbosity;

        if verbosity >= 1 {
            println!("{:?}", self);
        }
        if run_cfg.download.force_overwrite {
            println!("WARNING: --force flag set, existing files will be overwritten.");
        }

        let source = self.credential_source(&cfg);
        let credential = Arc::new(credential::load_credential(&source).await?);
        if credential.is_empty() {
            tracing::warn!(?source, "no bandcamp cookies found");
            println!("WARNING: no bandcamp cookies found; only public data will be visible.");
        }

        println!("Retrieving album links from user [{}]'s collection.", self.username);
        let user = self.username.clone();
        let cred = Arc::clone(&credential);
        let albums = tokio::task::spawn_blocking(move || collection::list_albums(&user, &cred)).await??;
        if verbosity >= 1 {
            println!("Found [{}] links for [{}]'s collection.", albums.len(), self.username);
        }
        if albums.is_empty() {
            return Err(NoAlbumsFound { user: self.username }.into());
        }

        println!("Starting album downloads...");
        let total = albums.len() as u64;
        let bar = std::io::stderr()
            .is_terminal()
            .then(|| Arc::new(BarReporter::new(total)));
        let progress: Arc<dyn ProgressReporter> = match &bar {
            Some(bar) => Arc::clone(bar) as Arc<dyn ProgressReporter>,
            None => Arc::new(PlainReporter::new(std::io::stdout(), total)),
        };

        let summary = tokio::task::spawn_blocking(move || download_all(albums, run_cfg, credential, progress)).await?;
        if let Some(bar) = bar {
            bar.finish();
        }

        println!("{}", summary);
        println!("Done.");
        Ok(())
    }
}

fn download_all(
    albums: Vec<collection::AlbumDescriptor>,
    run_cfg: RunConfig,
    credential: Arc<credential::Credential>,
    progress: Arc<dyn ProgressReporter>,
) -> scheduler::RunSummary {
    let RunConfig {
        download,
        retry,
        concurrency,
    } = run_cfg;
    let reporter = Reporter::new(progress, download.verbosity);
    let options = RunOptions {
        concurrency,
        retry,
        post_download_wait: download.post_download_wait,
    };
    let resolver = StorefrontResolver::new(download.file_format, Arc::clone(&credential));
    let writer = CurlTrackWriter::new(Arc::new(download), credential);
    let pipeline = Pipeline {
        resolver: &resolver,
        writer: &writer,
    };
    scheduler::run_albums(albums, &pipeline, &options, &reporter)
}
