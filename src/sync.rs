// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheRecord, CacheStore};
use crate::config::{CACHE_FILENAME, DEFAULT_PAGE_SIZE};
use crate::error::{ListingError, SyncError};
use crate::feed::{FeedMeta, build_feed, enclosure_url, write_feed};
use crate::listing::{ChannelItem, ListingApi, PageWalker};
use crate::media::{Fetcher, MediaMode, materialize};
use crate::policy::{HaltReason, SyncPolicy, Verdict};
use crate::progress::{ProgressEvent, SharedProgressReporter, SkipReason};
use crate::resolve::MediaResolver;
use crate::state::{SyncState, prepare_output_dir};

/// Feed publication settings
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Where the feed document is written
    pub path: PathBuf,
    pub title: String,
}

/// Options for channel synchronization
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Channel identifier passed to the listing API
    pub channel: String,
    pub output_dir: PathBuf,
    pub cache_path: PathBuf,
    pub page_size: u32,
    pub mode: MediaMode,
    /// Items published before this instant stop the walk
    pub cutoff: Option<DateTime<Utc>>,
    /// Maximum number of fresh downloads per run (None = all)
    pub limit: Option<usize>,
    /// Save the cache after every recorded item, not just at run end
    pub incremental_save: bool,
    /// Base URL under which mirrored files are published
    pub published_url_prefix: Option<Url>,
    pub feed: Option<FeedOptions>,
}

impl SyncOptions {
    /// Options with defaults for everything but the channel and directory
    pub fn new(channel: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            channel: channel.into(),
            cache_path: output_dir.join(CACHE_FILENAME),
            output_dir,
            page_size: DEFAULT_PAGE_SIZE,
            mode: MediaMode::Video,
            cutoff: None,
            limit: None,
            incremental_save: true,
            published_url_prefix: None,
            feed: None,
        }
    }
}

/// Result of a sync operation
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Number of items fetched this run
    pub downloaded: usize,
    /// Number of items passed over (already on disk or already attempted)
    pub skipped: usize,
    /// Number of items that failed to resolve or fetch
    pub failed: usize,
    /// Details of failed items (title, error message)
    pub failed_items: Vec<(String, String)>,
    pub pages_fetched: u32,
    pub halt: HaltReason,
    /// Total records in the cache after the run
    pub total_records: usize,
}

/// External collaborators of a sync run
pub struct Collaborators<'a, L: ?Sized, R: ?Sized, F: ?Sized> {
    pub listing: &'a L,
    pub resolver: &'a R,
    pub fetcher: &'a F,
}

/// Mirror a channel into the output directory
///
/// This is the main entry point for the library. It:
/// 1. Prepares the output directory and loads the cache
/// 2. Walks the listing newest first, page by page
/// 3. Materializes new items one at a time
/// 4. Persists the cache and, if enabled, writes the feed
///
/// A listing failure ends the walk; the cache and feed are still written
/// before the error is returned. Per-item failures never abort the run.
pub async fn sync_channel<L, R, F>(
    collaborators: Collaborators<'_, L, R, F>,
    options: &SyncOptions,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError>
where
    L: ListingApi + ?Sized,
    R: MediaResolver + ?Sized,
    F: Fetcher + ?Sized,
{
    let cleaned = prepare_output_dir(&options.output_dir)?;
    if cleaned > 0 {
        reporter.report(ProgressEvent::PartialFilesCleanedUp { count: cleaned });
    }

    let store = CacheStore::new(&options.cache_path);
    let state = SyncState::from_records(store.load_or_default().await);
    reporter.report(ProgressEvent::CacheLoaded {
        records: state.records().len(),
    });

    let mut session = Session {
        resolver: collaborators.resolver,
        fetcher: collaborators.fetcher,
        options,
        policy: SyncPolicy::new(options.mode, options.cutoff, &options.output_dir),
        store,
        state,
        reporter: reporter.clone(),
        downloaded: 0,
        skipped: 0,
        failed: 0,
        failed_items: Vec::new(),
    };

    let mut walker = PageWalker::new(collaborators.listing, &options.channel, options.page_size);
    let outcome = session.walk(&mut walker).await;

    let halt = match &outcome {
        Ok(halt) => *halt,
        Err(e) => {
            warn!(error = %e, "listing fetch failed, stopping walk");
            HaltReason::ListingFailed
        }
    };
    reporter.report(ProgressEvent::WalkHalted { reason: halt });
    info!(pages = walker.pages_fetched(), %halt, "walk finished");

    session.save_cache().await;

    if let Some(feed) = &options.feed {
        publish_feed(feed, options, session.state.records(), &reporter).await;
    }

    reporter.report(ProgressEvent::SyncCompleted {
        downloaded_count: session.downloaded,
        skipped_count: session.skipped,
        failed_count: session.failed,
    });

    outcome?;

    Ok(SyncResult {
        downloaded: session.downloaded,
        skipped: session.skipped,
        failed: session.failed,
        failed_items: session.failed_items,
        pages_fetched: walker.pages_fetched(),
        halt,
        total_records: session.state.records().len(),
    })
}

async fn publish_feed(
    feed: &FeedOptions,
    options: &SyncOptions,
    records: &[CacheRecord],
    reporter: &SharedProgressReporter,
) {
    let meta = FeedMeta {
        title: feed.title.clone(),
        link: options
            .published_url_prefix
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default(),
        description: format!("Mirror of {}", options.channel),
    };

    let channel = build_feed(&meta, records, Utc::now());
    match write_feed(&channel, &feed.path).await {
        Ok(()) => reporter.report(ProgressEvent::FeedWritten {
            path: feed.path.clone(),
            entries: records.len(),
        }),
        Err(e) => warn!(error = %e, "failed to write feed"),
    }
}

struct Session<'a, R: ?Sized, F: ?Sized> {
    resolver: &'a R,
    fetcher: &'a F,
    options: &'a SyncOptions,
    policy: SyncPolicy,
    store: CacheStore,
    state: SyncState,
    reporter: SharedProgressReporter,
    downloaded: usize,
    skipped: usize,
    failed: usize,
    failed_items: Vec<(String, String)>,
}

impl<R, F> Session<'_, R, F>
where
    R: MediaResolver + ?Sized,
    F: Fetcher + ?Sized,
{
    async fn walk<L>(&mut self, walker: &mut PageWalker<'_, L>) -> Result<HaltReason, ListingError>
    where
        L: ListingApi + ?Sized,
    {
        loop {
            if walker.is_finished() {
                return Ok(HaltReason::Exhausted);
            }

            self.reporter.report(ProgressEvent::FetchingPage {
                page: walker.pages_fetched() + 1,
            });

            let Some(page) = walker.next_page().await? else {
                return Ok(HaltReason::Exhausted);
            };

            self.reporter.report(ProgressEvent::PageFetched {
                page: page.number,
                items: page.items.len(),
            });

            let mut halt_after_page = false;

            for index in 0..page.items.len() {
                let decision = self.policy.decide(&self.state, &page.items, index);
                let item = &page.items[index];

                if decision.lookahead_hit && !halt_after_page {
                    debug!(page = page.number, index, "known item ahead on this page");
                    halt_after_page = true;
                }

                match decision.verdict {
                    Verdict::StopCutoff => {
                        debug!(title = %item.title, "item older than cutoff");
                        walker.stop();
                        return Ok(HaltReason::Cutoff);
                    }
                    Verdict::SkipKnown => {
                        debug!(title = %item.title, "already mirrored");
                        halt_after_page = true;
                    }
                    Verdict::SkipAttempted => {
                        self.skip(item, SkipReason::AlreadyAttempted);
                    }
                    Verdict::SkipExisting => {
                        self.record_existing(item).await;
                        self.skip(item, SkipReason::AlreadyOnDisk);
                    }
                    Verdict::Materialize => {
                        if self.options.limit.is_some_and(|limit| self.downloaded >= limit) {
                            walker.stop();
                            return Ok(HaltReason::Limit);
                        }
                        self.materialize(item).await;
                    }
                }
            }

            if halt_after_page {
                walker.stop();
                return Ok(HaltReason::CaughtUp);
            }
        }
    }

    fn skip(&mut self, item: &ChannelItem, reason: SkipReason) {
        self.skipped += 1;
        self.reporter.report(ProgressEvent::ItemSkipped {
            title: item.title.clone(),
            reason,
        });
    }

    fn feed_url_for(&self, basename: &str) -> String {
        enclosure_url(self.options.published_url_prefix.as_ref(), basename)
    }

    /// Record an item whose output is already on disk without fetching it
    async fn record_existing(&mut self, item: &ChannelItem) {
        let basename = self.policy.basename_for(item);
        let record = CacheRecord {
            title: item.title.clone(),
            output_file: self.policy.output_path_for(item),
            feed_url: self.feed_url_for(&basename),
            published_at: item.published_at,
            description: String::new(),
            source_url: item.source_url.clone(),
        };

        if self.state.record(record) {
            debug!(title = %item.title, "recorded existing file");
            self.checkpoint().await;
        }
    }

    async fn materialize(&mut self, item: &ChannelItem) {
        self.state.mark_attempted(&item.source_url);

        self.reporter.report(ProgressEvent::DownloadStarting {
            title: item.title.clone(),
            index: self.downloaded + self.failed,
        });

        let basename = self.policy.basename_for(item);
        let output_path = self.policy.output_path_for(item);
        let feed_url = self.feed_url_for(&basename);

        let result = materialize(
            self.resolver,
            self.fetcher,
            item,
            &output_path,
            self.policy.mode(),
            feed_url,
        )
        .await;

        match result {
            Ok(record) => {
                self.state.record(record);
                self.downloaded += 1;
                self.reporter.report(ProgressEvent::DownloadCompleted {
                    title: item.title.clone(),
                    path: output_path,
                });
                self.checkpoint().await;
            }
            Err(e) => {
                warn!(title = %item.title, error = %e, "failed to materialize item");
                self.failed += 1;
                self.failed_items.push((item.title.clone(), e.to_string()));
                self.reporter.report(ProgressEvent::DownloadFailed {
                    title: item.title.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    async fn checkpoint(&self) {
        if self.options.incremental_save {
            self.save_cache().await;
        }
    }

    async fn save_cache(&self) {
        if let Err(e) = self.store.save(self.state.records()).await {
            warn!(error = %e, "failed to save cache");
        }
    }
}
