// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::error::ListingError;
use crate::http::HttpClient;

use super::item::{ListingPage, parse_listing};

/// Source of channel listing pages.
///
/// Implementations must return items newest first. The cutoff and dedup
/// short-circuits rely on that order.
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Fetch one page (1-based) of the channel listing
    async fn fetch_page(
        &self,
        channel: &str,
        page: u32,
        page_size: u32,
    ) -> Result<ListingPage, ListingError>;
}

/// Listing API speaking the JSON-RPC `claim_search` method
pub struct ClaimSearchApi<C> {
    client: C,
    api_url: Url,
    site_url: Url,
}

impl<C: HttpClient> ClaimSearchApi<C> {
    pub fn new(client: C, api_url: Url, site_url: Url) -> Self {
        Self {
            client,
            api_url,
            site_url,
        }
    }

    fn request_body(channel: &str, page: u32, page_size: u32) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "method": "claim_search",
            "params": {
                "channel": channel,
                "page": page,
                "page_size": page_size,
                "order_by": ["release_time"],
                "stream_types": ["video", "audio"],
                "has_source": true,
                "no_totals": true,
            }
        })
    }
}

#[async_trait]
impl<C: HttpClient> ListingApi for ClaimSearchApi<C> {
    async fn fetch_page(
        &self,
        channel: &str,
        page: u32,
        page_size: u32,
    ) -> Result<ListingPage, ListingError> {
        let body = Self::request_body(channel, page, page_size);

        let bytes = self
            .client
            .post_json(self.api_url.as_str(), &body)
            .await
            .map_err(|e| ListingError::Request { page, source: e })?;

        parse_listing(&bytes, page, self.site_url.as_str(), channel)
    }
}
