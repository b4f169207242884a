// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::ResolveError;
use crate::http::HttpClient;

static LD_JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("static regex is valid")
});

/// Direct media location for one channel item
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub content_url: String,
    pub description: Option<String>,
    /// The raw structured metadata block
    pub metadata: serde_json::Value,
}

/// Turns an item's content page into a direct media URL
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, page_url: &str) -> Result<ResolvedMedia, ResolveError>;
}

/// Resolver reading the `application/ld+json` block of the content page
pub struct PageMetadataResolver<C> {
    client: C,
}

impl<C: HttpClient> PageMetadataResolver<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> MediaResolver for PageMetadataResolver<C> {
    async fn resolve(&self, page_url: &str) -> Result<ResolvedMedia, ResolveError> {
        let bytes = self
            .client
            .get_bytes(page_url)
            .await
            .map_err(|e| ResolveError::Fetch {
                url: page_url.to_string(),
                source: e,
            })?;

        let html = String::from_utf8_lossy(&bytes);
        extract_media(&html, page_url)
    }
}

/// Extract the media location from a content page's structured metadata
pub fn extract_media(html: &str, page_url: &str) -> Result<ResolvedMedia, ResolveError> {
    let block = LD_JSON_BLOCK
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| ResolveError::MissingMetadata {
            url: page_url.to_string(),
        })?;

    let metadata: serde_json::Value =
        serde_json::from_str(block).map_err(|e| ResolveError::InvalidMetadata {
            url: page_url.to_string(),
            source: e,
        })?;

    let content_url = metadata
        .get("contentUrl")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ResolveError::NoContentUrl {
            url: page_url.to_string(),
        })?
        .to_string();

    let description = metadata
        .get("description")
        .and_then(|v| v.as_str())
        .map(|s| html_escape::decode_html_entities(s).into_owned());

    Ok(ResolvedMedia {
        content_url,
        description,
        metadata,
    })
}
