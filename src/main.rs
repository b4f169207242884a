// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use chanpull::{
    ClaimSearchApi, Collaborators, Config, ConfigInput, ExternalTool, NoopReporter,
    PageMetadataResolver, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, SkipReason, sync_channel,
};

// Emoji with fallback for terminals without Unicode support
static TV: Emoji<'_, '_> = Emoji("📺 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[-] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Mirror a media channel to disk and republish it as an RSS feed
#[derive(Parser, Debug)]
#[command(name = "chanpull")]
#[command(about = "Mirror a media channel to disk and republish it as an RSS feed")]
#[command(version)]
struct Args {
    /// Channel identifier
    #[arg(env = "CHANPULL_CHANNEL")]
    channel: Option<String>,

    /// Output directory for mirrored media
    #[arg(env = "CHANPULL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Listing API endpoint
    #[arg(long, env = "CHANPULL_API_URL")]
    api_url: Option<String>,

    /// Base URL of item content pages
    #[arg(long, env = "CHANPULL_SITE_URL")]
    site_url: Option<String>,

    /// Do not mirror items published before this date (YYYY-MM-DD)
    #[arg(long, env = "CHANPULL_SINCE")]
    since: Option<String>,

    /// Number of items requested per listing page
    #[arg(long, env = "CHANPULL_PAGE_SIZE")]
    page_size: Option<u32>,

    /// Extract audio only
    #[arg(short, long, env = "CHANPULL_AUDIO_ONLY")]
    audio_only: bool,

    /// Maximum number of items to download in this run
    #[arg(short, long)]
    limit: Option<usize>,

    /// Cache file (defaults to cache.json in the output directory)
    #[arg(long, env = "CHANPULL_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    /// Only save the cache at the end of the run
    #[arg(long)]
    no_incremental_save: bool,

    /// Write an RSS feed of the mirrored items
    #[arg(long, env = "CHANPULL_FEED")]
    feed: bool,

    /// Feed file (defaults to feed.xml in the output directory)
    #[arg(long, env = "CHANPULL_FEED_PATH")]
    feed_path: Option<PathBuf>,

    /// Feed title (defaults to the channel identifier)
    #[arg(long, env = "CHANPULL_FEED_TITLE")]
    feed_title: Option<String>,

    /// URL prefix under which the output directory is published
    #[arg(long, env = "CHANPULL_URL_PREFIX")]
    url_prefix: Option<String>,

    /// Downloader executable
    #[arg(long, env = "CHANPULL_DOWNLOADER")]
    downloader: Option<PathBuf>,

    /// Transcoder executable handed to the downloader
    #[arg(long, env = "CHANPULL_TRANSCODER")]
    transcoder: Option<PathBuf>,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for ConfigInput {
    fn from(args: Args) -> Self {
        Self {
            channel: args.channel,
            output_dir: args.output_dir,
            api_url: args.api_url,
            site_url: args.site_url,
            cutoff: args.since,
            page_size: args.page_size,
            audio_only: args.audio_only,
            limit: args.limit,
            cache_file: args.cache_file,
            no_incremental_save: args.no_incremental_save,
            feed: args.feed,
            feed_path: args.feed_path,
            feed_title: args.feed_title,
            url_prefix: args.url_prefix,
            downloader: args.downloader,
            transcoder: args.transcoder,
        }
    }
}

/// Progress reporter using an indicatif spinner for terminal output
struct IndicatifReporter {
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Result<Self> {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .context("Invalid progress template")?;

        let main_bar = ProgressBar::new_spinner();
        main_bar.set_style(style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Ok(Self { main_bar })
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PartialFilesCleanedUp { count } => {
                self.main_bar.println(format!(
                    "  Removed {} leftover partial file(s)",
                    count.to_string().yellow()
                ));
            }

            ProgressEvent::CacheLoaded { records } => {
                self.main_bar.set_message(format!(
                    "{FOLDER}{} items already mirrored",
                    records.to_string().cyan()
                ));
            }

            ProgressEvent::FetchingPage { page } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}Fetching listing page {}",
                    page.to_string().cyan()
                ));
            }

            ProgressEvent::PageFetched { page, items } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}Page {} • {} items",
                    page.to_string().cyan(),
                    items.to_string().cyan()
                ));
            }

            ProgressEvent::ItemSkipped { title, reason } => {
                let why = match reason {
                    SkipReason::AlreadyOnDisk => "already on disk",
                    SkipReason::AlreadyAttempted => "already attempted",
                };
                self.main_bar.println(format!(
                    "  {SKIP}{} ({})",
                    truncate_title(&title, 50).dimmed(),
                    why
                ));
            }

            ProgressEvent::DownloadStarting { title, index } => {
                self.main_bar.set_message(format!(
                    "{DOWNLOAD}[{}] {}",
                    (index + 1).to_string().cyan(),
                    truncate_title(&title, 50)
                ));
            }

            ProgressEvent::DownloadCompleted { title, .. } => {
                self.main_bar
                    .println(format!("  {SUCCESS}{}", truncate_title(&title, 60).green()));
            }

            ProgressEvent::DownloadFailed { title, error } => {
                self.main_bar.println(format!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&title, 40).red(),
                    error.red()
                ));
            }

            ProgressEvent::WalkHalted { reason } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Walk finished: {}", reason.to_string().dimmed()));
            }

            ProgressEvent::FeedWritten { path, entries } => {
                self.main_bar.println(format!(
                    "  {FOLDER}Feed with {} entries written to {}",
                    entries.to_string().cyan(),
                    path.display().to_string().cyan()
                ));
            }

            ProgressEvent::SyncCompleted {
                downloaded_count,
                skipped_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} skipped, {} failed",
                    "Sync complete:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    skipped_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "chanpull=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let quiet = args.quiet;

    init_logging(args.verbose);

    let config = match Config::from_input(ConfigInput::from(args)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    if !quiet {
        println!(
            "\n{}{} {}\n",
            TV,
            "chanpull".bold().magenta(),
            "- Channel Mirror".dimmed()
        );
    }

    let client = ReqwestClient::new();
    let listing = ClaimSearchApi::new(client.clone(), config.api_url.clone(), config.site_url.clone());
    let resolver = PageMetadataResolver::new(client);
    let fetcher = ExternalTool::new(config.tools.clone());

    let reporter: SharedProgressReporter = if quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new()?)
    };

    let result = sync_channel(
        Collaborators {
            listing: &listing,
            resolver: &resolver,
            fetcher: &fetcher,
        },
        &config.sync,
        reporter,
    )
    .await
    .context("Failed to sync channel")?;

    if !quiet && !result.failed_items.is_empty() {
        println!("\n{}", "Failed items:".red().bold());
        for (title, error) in &result.failed_items {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !quiet {
        println!(
            "\n{FOLDER}Output: {} ({} items, {})\n",
            config.sync.output_dir.display().to_string().cyan(),
            result.total_records.to_string().cyan(),
            result.halt.to_string().dimmed()
        );
    }

    Ok(())
}
