// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use tracing::info;

use crate::cache::CacheRecord;
use crate::error::MaterializeError;
use crate::listing::ChannelItem;
use crate::resolve::MediaResolver;

use super::fetch::{Fetcher, PartialOutput};
use super::filename::MediaMode;

/// Resolve, fetch and record one channel item.
///
/// Any file left at `output_path` (or its `.part` sibling) is removed when
/// resolution or the fetch fails.
pub async fn materialize<R, F>(
    resolver: &R,
    fetcher: &F,
    item: &ChannelItem,
    output_path: &Path,
    mode: MediaMode,
    feed_url: String,
) -> Result<CacheRecord, MaterializeError>
where
    R: MediaResolver + ?Sized,
    F: Fetcher + ?Sized,
{
    let media = resolver.resolve(&item.source_url).await?;

    let guard = PartialOutput::new(output_path);
    fetcher.fetch(&media.content_url, output_path, mode).await?;
    guard.commit();

    info!(title = %item.title, path = %output_path.display(), "materialized item");

    Ok(CacheRecord {
        title: item.title.clone(),
        output_file: output_path.to_path_buf(),
        feed_url,
        published_at: item.published_at,
        description: media.description.unwrap_or_default(),
        source_url: item.source_url.clone(),
    })
}
