mod build;

pub use build::{FeedMeta, build_feed, enclosure_url, extension_to_mime, write_feed};
