// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use url::Url;

use crate::error::ConfigError;
use crate::media::{MediaMode, ToolPaths};
use crate::sync::{FeedOptions, SyncOptions};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";
pub const CACHE_FILENAME: &str = "cache.json";
pub const FEED_FILENAME: &str = "feed.xml";

/// Unvalidated configuration as collected from arguments and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigInput {
    pub channel: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub site_url: Option<String>,
    /// Oldest publication date to mirror, `YYYY-MM-DD`
    pub cutoff: Option<String>,
    pub page_size: Option<u32>,
    pub audio_only: bool,
    pub limit: Option<usize>,
    pub cache_file: Option<PathBuf>,
    pub no_incremental_save: bool,
    pub feed: bool,
    pub feed_path: Option<PathBuf>,
    pub feed_title: Option<String>,
    pub url_prefix: Option<String>,
    pub downloader: Option<PathBuf>,
    pub transcoder: Option<PathBuf>,
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub sync: SyncOptions,
    pub api_url: Url,
    pub site_url: Url,
    pub tools: ToolPaths,
}

impl Config {
    /// Validate `input`, locating tools on `PATH`
    pub fn from_input(input: ConfigInput) -> Result<Self, ConfigError> {
        Self::from_input_with(input, |program| which::which(program))
    }

    /// Validate `input` with a custom executable lookup
    pub fn from_input_with<W>(input: ConfigInput, locate: W) -> Result<Self, ConfigError>
    where
        W: Fn(&Path) -> Result<PathBuf, which::Error>,
    {
        let channel = required(input.channel, "channel")?;
        let output_dir = input
            .output_dir
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingParameter("output directory"))?;
        let api_url = parse_url("listing API", required(input.api_url, "api-url")?)?;
        let site_url = parse_url("site", required(input.site_url, "site-url")?)?;

        let cutoff = input.cutoff.as_deref().map(parse_cutoff).transpose()?;

        let page_size = input.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        let published_url_prefix = input
            .url_prefix
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_url("published", s))
            .transpose()?;

        let feed = if input.feed {
            if published_url_prefix.is_none() {
                return Err(ConfigError::MissingParameter("url-prefix"));
            }
            Some(FeedOptions {
                path: input
                    .feed_path
                    .unwrap_or_else(|| output_dir.join(FEED_FILENAME)),
                title: input
                    .feed_title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| channel.clone()),
            })
        } else {
            None
        };

        let mode = MediaMode::from_audio_only(input.audio_only);
        let tools = locate_tools(input.downloader, input.transcoder, mode, &locate)?;

        let sync = SyncOptions {
            cache_path: input
                .cache_file
                .unwrap_or_else(|| output_dir.join(CACHE_FILENAME)),
            channel,
            output_dir,
            page_size,
            mode,
            cutoff,
            limit: input.limit,
            incremental_save: !input.no_incremental_save,
            published_url_prefix,
            feed,
        };

        Ok(Self {
            sync,
            api_url,
            site_url,
            tools,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingParameter(name))
}

fn parse_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        name,
        value,
        source: e,
    })
}

/// Parse a `YYYY-MM-DD` cutoff into midnight UTC of that day
pub fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ConfigError::InvalidDate {
            value: value.to_string(),
            source: e,
        }
    })?;

    Ok(date.and_time(NaiveTime::default()).and_utc())
}

/// Resolve tool locations. The transcoder is mandatory for audio extraction
/// and used opportunistically otherwise.
fn locate_tools<W>(
    downloader: Option<PathBuf>,
    transcoder: Option<PathBuf>,
    mode: MediaMode,
    locate: &W,
) -> Result<ToolPaths, ConfigError>
where
    W: Fn(&Path) -> Result<PathBuf, which::Error>,
{
    let find = |program: PathBuf| {
        locate(&program).map_err(|e| ConfigError::ToolNotFound {
            program: program.display().to_string(),
            source: e,
        })
    };

    let downloader = find(downloader.unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOADER)))?;

    let transcoder = match (transcoder, mode) {
        (Some(path), _) => Some(find(path)?),
        (None, MediaMode::Audio) => Some(find(PathBuf::from(DEFAULT_TRANSCODER))?),
        (None, MediaMode::Video) => locate(Path::new(DEFAULT_TRANSCODER)).ok(),
    };

    Ok(ToolPaths {
        downloader,
        transcoder,
    })
}
