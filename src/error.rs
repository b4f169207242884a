// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating the run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid cutoff date '{value}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Invalid {name} URL '{value}': {source}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Could not locate executable '{program}': {source}")]
    ToolNotFound {
        program: String,
        #[source]
        source: which::Error,
    },
}

/// Errors from the underlying HTTP transport
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Errors that can occur while fetching a page of the channel listing
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Failed to fetch listing page {page}: {source}")]
    Request {
        page: u32,
        #[source]
        source: HttpError,
    },

    #[error("Malformed listing response for page {page}: {source}")]
    InvalidResponse {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("Listing API rejected page {page}: {message}")]
    Rpc { page: u32, message: String },
}

/// Errors that can occur while resolving an item's direct media URL
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to fetch item page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: HttpError,
    },

    #[error("No structured metadata block found on {url}")]
    MissingMetadata { url: String },

    #[error("Malformed structured metadata on {url}: {source}")]
    InvalidMetadata {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Structured metadata on {url} carries no content URL")]
    NoContentUrl { url: String },
}

/// Errors from the external fetch/transcode tool
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Errors that abort materializing a single item
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors that can occur while reading or writing the cache file
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse cache JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while writing the feed document
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to write feed {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-terminating errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    #[error("Failed to create output directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
