// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::ListingError;

/// A single entry of the remote channel listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelItem {
    pub title: String,
    /// Publication time in epoch seconds
    pub published_at: Option<i64>,
    /// URL of the item's content page
    pub source_url: String,
}

impl ChannelItem {
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// One page of the listing as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub items: Vec<ChannelItem>,
    /// Entries the API returned, including any rejected while parsing.
    /// Page-length checks use this, not `items.len()`.
    pub raw_len: usize,
}

impl ListingPage {
    /// True if the API returned no entries at all
    pub fn is_empty(&self) -> bool {
        self.raw_len == 0
    }
}

impl From<Vec<ChannelItem>> for ListingPage {
    fn from(items: Vec<ChannelItem>) -> Self {
        let raw_len = items.len();
        Self { items, raw_len }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<ClaimSearchResult>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ClaimSearchResult {
    #[serde(default)]
    items: Vec<RawClaim>,
}

#[derive(Debug, Deserialize)]
struct RawClaim {
    name: Option<String>,
    timestamp: Option<i64>,
    #[serde(default)]
    value: ClaimValue,
}

#[derive(Debug, Default, Deserialize)]
struct ClaimValue {
    title: Option<String>,
    release_time: Option<serde_json::Value>,
}

/// Parse a `claim_search` response body into a listing page
///
/// Entries without a `name` cannot be turned into a content page URL and are
/// dropped, but still count towards `raw_len`. Listing order is preserved.
pub fn parse_listing(
    body: &[u8],
    page: u32,
    site_url: &str,
    channel: &str,
) -> Result<ListingPage, ListingError> {
    let response: RpcResponse = serde_json::from_slice(body)
        .map_err(|e| ListingError::InvalidResponse { page, source: e })?;

    if let Some(error) = response.error {
        return Err(ListingError::Rpc {
            page,
            message: error.message,
        });
    }

    let result = response.result.ok_or_else(|| ListingError::Rpc {
        page,
        message: "response carried no result".to_string(),
    })?;

    let site = site_url.trim_end_matches('/');
    let raw_len = result.items.len();

    let items = result
        .items
        .into_iter()
        .filter_map(|claim| {
            let Some(name) = claim.name.filter(|n| !n.is_empty()) else {
                warn!(page, "dropping listing entry without a name");
                return None;
            };

            let published_at = claim
                .value
                .release_time
                .as_ref()
                .and_then(epoch_seconds)
                .or(claim.timestamp);

            let title = claim
                .value
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| name.clone());

            Some(ChannelItem {
                title,
                published_at,
                source_url: format!("{site}/{channel}/{name}"),
            })
        })
        .collect();

    Ok(ListingPage { items, raw_len })
}

/// Release times arrive either as JSON numbers or as numeric strings
fn epoch_seconds(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
