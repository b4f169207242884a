// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use chrono::{DateTime, Utc};
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};
use url::Url;

use crate::cache::CacheRecord;
use crate::error::FeedError;
use crate::persist::write_atomic;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Channel-level fields of the published feed
#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// Build the feed channel from `records`.
///
/// Records are ordered newest first; undated records sort as `now`. Ties keep
/// their order in `records`.
pub fn build_feed(meta: &FeedMeta, records: &[CacheRecord], now: DateTime<Utc>) -> Channel {
    let mut ordered: Vec<&CacheRecord> = records.iter().collect();
    let now_secs = now.timestamp();
    ordered.sort_by_key(|record| std::cmp::Reverse(record.published_at.unwrap_or(now_secs)));

    let items: Vec<Item> = ordered.into_iter().map(feed_item).collect();

    ChannelBuilder::default()
        .title(meta.title.clone())
        .link(meta.link.clone())
        .description(meta.description.clone())
        .items(items)
        .build()
}

fn feed_item(record: &CacheRecord) -> Item {
    let mime_type = record
        .output_file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(extension_to_mime)
        .unwrap_or(FALLBACK_MIME_TYPE);

    let enclosure = EnclosureBuilder::default()
        .url(record.feed_url.clone())
        .mime_type(mime_type.to_string())
        .length("0".to_string())
        .build();

    let guid = GuidBuilder::default()
        .value(record.source_url.clone())
        .permalink(false)
        .build();

    ItemBuilder::default()
        .title(Some(record.title.clone()))
        .description(Some(record.description.clone()).filter(|d| !d.is_empty()))
        .pub_date(record.published_at.and_then(format_pub_date))
        .enclosure(Some(enclosure))
        .guid(Some(guid))
        .build()
}

/// RFC 1123 timestamp, always in GMT
fn format_pub_date(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

/// Map file extensions to MIME types
pub fn extension_to_mime(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "mp3" => Some("audio/mpeg"),
        "m4a" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "flac" => Some("audio/flac"),
        "wav" => Some("audio/wav"),
        "mp4" | "m4v" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

/// Published URL for a mirrored file: `prefix` joined with the basename, or
/// the bare basename without a prefix
pub fn enclosure_url(prefix: Option<&Url>, basename: &str) -> String {
    let Some(prefix) = prefix else {
        return basename.to_string();
    };

    let mut base = prefix.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    // A leading "./" keeps names such as "a:b.mp4" from parsing as a scheme
    base.join(&format!("./{basename}"))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("{base}{basename}"))
}

/// Serialize and write the feed to `path`
pub async fn write_feed(channel: &Channel, path: &Path) -> Result<(), FeedError> {
    let xml = channel.to_string();
    write_atomic(path, xml.as_bytes())
        .await
        .map_err(|e| FeedError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
