// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::persist::write_atomic;

/// Durable record of one mirrored item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub title: String,
    #[serde(rename = "file")]
    pub output_file: PathBuf,
    /// Published URL of the mirrored file
    #[serde(rename = "url")]
    pub feed_url: String,
    /// Publication time in epoch seconds
    #[serde(rename = "date")]
    pub published_at: Option<i64>,
    #[serde(default)]
    pub description: String,
    pub source_url: String,
}

impl CacheRecord {
    /// File name of the output, the second dedup key next to `source_url`
    pub fn basename(&self) -> Option<String> {
        self.output_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    items: Vec<CacheRecord>,
}

/// Reads and writes the `{ "items": [...] }` cache document
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing file is an empty cache.
    pub async fn load(&self) -> Result<Vec<CacheRecord>, CacheError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cache file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CacheError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let file: CacheFile =
            serde_json::from_str(&content).map_err(|e| CacheError::JsonParseFailed {
                path: self.path.clone(),
                source: e,
            })?;

        Ok(file.items)
    }

    /// Load all records, starting empty when the cache cannot be read
    pub async fn load_or_default(&self) -> Vec<CacheRecord> {
        self.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable cache, starting empty");
            Vec::new()
        })
    }

    /// Overwrite the cache with `records`
    pub async fn save(&self, records: &[CacheRecord]) -> Result<(), CacheError> {
        let file = CacheFileRef { items: records };
        let json = serde_json::to_string_pretty(&file)?;

        write_atomic(&self.path, json.as_bytes())
            .await
            .map_err(|e| CacheError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })
    }
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    items: &'a [CacheRecord],
}
