// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;

use crate::policy::HaltReason;

/// Why an item was passed over without fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Output file already on disk
    AlreadyOnDisk,
    /// Already tried earlier in this run
    AlreadyAttempted,
}

/// Events emitted during channel synchronization for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Leftover partial files were removed from the output directory
    PartialFilesCleanedUp { count: usize },

    /// The persisted cache has been loaded
    CacheLoaded { records: usize },

    /// A listing page is being requested
    FetchingPage { page: u32 },

    /// A listing page arrived
    PageFetched { page: u32, items: usize },

    /// An item was passed over
    ItemSkipped { title: String, reason: SkipReason },

    /// An item is being resolved and fetched
    DownloadStarting {
        title: String,
        /// Number of fetches attempted before this one
        index: usize,
    },

    /// An item was fetched and recorded
    DownloadCompleted { title: String, path: PathBuf },

    /// An item failed to resolve or fetch
    DownloadFailed { title: String, error: String },

    /// The listing walk ended
    WalkHalted { reason: HaltReason },

    /// The feed document was written
    FeedWritten { path: PathBuf, entries: usize },

    /// Sync operation completed
    SyncCompleted {
        downloaded_count: usize,
        skipped_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
