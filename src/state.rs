// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use crate::cache::CacheRecord;
use crate::error::SyncError;
use crate::persist::PARTIAL_SUFFIX;

/// Suffix the downloader uses for in-progress files
const TOOL_PARTIAL_SUFFIX: &str = ".part";

/// Per-run sync state, seeded from the persisted cache.
///
/// `source_url` and the output basename are each unique across `records`.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    known_sources: HashSet<String>,
    known_basenames: HashSet<String>,
    /// Source URLs already tried during this run, successful or not
    attempted: HashSet<String>,
    records: Vec<CacheRecord>,
}

impl SyncState {
    /// Build the state from persisted records, dropping later duplicates
    pub fn from_records(records: Vec<CacheRecord>) -> Self {
        let mut state = Self::default();
        let total = records.len();

        for record in records {
            state.record(record);
        }

        let dropped = total - state.records.len();
        if dropped > 0 {
            warn!(dropped, "dropped duplicate cache entries");
        }

        state
    }

    pub fn is_known_source(&self, source_url: &str) -> bool {
        self.known_sources.contains(source_url)
    }

    pub fn is_known_basename(&self, basename: &str) -> bool {
        self.known_basenames.contains(basename)
    }

    /// True if either dedup key is already taken
    pub fn is_known(&self, source_url: &str, basename: &str) -> bool {
        self.is_known_source(source_url) || self.is_known_basename(basename)
    }

    /// Append a record and register its keys.
    ///
    /// Returns `false` (and keeps the state unchanged) if either key is taken.
    pub fn record(&mut self, record: CacheRecord) -> bool {
        let basename = record.basename().unwrap_or_default();
        if self.is_known_source(&record.source_url)
            || (!basename.is_empty() && self.is_known_basename(&basename))
        {
            return false;
        }

        self.known_sources.insert(record.source_url.clone());
        if !basename.is_empty() {
            self.known_basenames.insert(basename);
        }
        self.records.push(record);
        true
    }

    /// Mark an item as attempted; returns `false` if it already was
    pub fn mark_attempted(&mut self, source_url: &str) -> bool {
        self.attempted.insert(source_url.to_string())
    }

    pub fn was_attempted(&self, source_url: &str) -> bool {
        self.attempted.contains(source_url)
    }

    pub fn records(&self) -> &[CacheRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CacheRecord> {
        self.records
    }
}

/// Create the output directory if needed and remove leftovers of interrupted
/// runs (`.partial` and `.part` files). Returns the number of files removed.
pub fn prepare_output_dir(output_dir: &Path) -> Result<usize, SyncError> {
    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir).map_err(|e| SyncError::CreateDirectoryFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        return Ok(0);
    }

    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %output_dir.display(), error = %e, "cannot scan output directory");
            return Ok(0);
        }
    };

    let mut cleaned = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX) || n.ends_with(TOOL_PARTIAL_SUFFIX));

        if is_partial && path.is_file() && std::fs::remove_file(&path).is_ok() {
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
