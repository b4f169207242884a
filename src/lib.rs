// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod listing;
pub mod media;
pub mod persist;
pub mod policy;
pub mod progress;
pub mod resolve;
pub mod state;
pub mod sync;

// Re-export main types for convenience
pub use cache::{CacheRecord, CacheStore};
pub use config::{Config, ConfigInput};
pub use error::{
    CacheError, ConfigError, FeedError, FetchError, HttpError, ListingError, MaterializeError,
    ResolveError, SyncError,
};
pub use feed::{FeedMeta, build_feed, write_feed};
pub use http::{HttpClient, ReqwestClient};
pub use listing::{ChannelItem, ClaimSearchApi, ListingApi, ListingPage, PageWalker};
pub use media::{ExternalTool, Fetcher, MediaMode, ToolPaths, generate_filename, sanitize_title};
pub use policy::{HaltReason, SyncPolicy, Verdict};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, SkipReason};
pub use resolve::{MediaResolver, PageMetadataResolver, ResolvedMedia};
pub use state::SyncState;
pub use sync::{Collaborators, FeedOptions, SyncOptions, SyncResult, sync_channel};
