// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::FetchError;

use super::filename::MediaMode;

/// Format selection for video mode: mp4 video with m4a audio where possible
const VIDEO_FORMAT: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/b";

/// Format selection for audio mode
const AUDIO_FORMAT: &str = "bestaudio/best";

/// Locations of the external executables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// The fetch/transcode tool (yt-dlp compatible command line)
    pub downloader: PathBuf,
    /// Transcoder passed to the downloader, required for audio extraction
    pub transcoder: Option<PathBuf>,
}

/// Downloads one media URL to a local file
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, media_url: &str, output: &Path, mode: MediaMode)
    -> Result<(), FetchError>;
}

/// Fetcher delegating to an external yt-dlp compatible executable
#[derive(Debug, Clone)]
pub struct ExternalTool {
    tools: ToolPaths,
}

impl ExternalTool {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    /// Build the argument list for one invocation
    pub fn arguments(&self, media_url: &str, output: &Path, mode: MediaMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-progress".into(),
            "--no-playlist".into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ];

        match mode {
            MediaMode::Audio => {
                args.extend(["-f", AUDIO_FORMAT, "-x", "--audio-format", "mp3"].map(OsString::from));
            }
            MediaMode::Video => {
                args.extend(["-f", VIDEO_FORMAT, "--merge-output-format", "mp4"].map(OsString::from));
            }
        }

        if let Some(transcoder) = &self.tools.transcoder {
            args.push("--ffmpeg-location".into());
            args.push(transcoder.as_os_str().to_owned());
        }

        args.push(media_url.into());
        args
    }
}

#[async_trait]
impl Fetcher for ExternalTool {
    async fn fetch(
        &self,
        media_url: &str,
        output: &Path,
        mode: MediaMode,
    ) -> Result<(), FetchError> {
        let program = self.tools.downloader.display().to_string();
        let args = self.arguments(media_url, output, mode);

        debug!(%program, ?args, "invoking downloader");

        let result = Command::new(&self.tools.downloader)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let last_line = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();

        Err(FetchError::Exit {
            program,
            code: result.status.code(),
            stderr: last_line,
        })
    }
}

/// Removes a partially written output unless the fetch is committed.
///
/// Also removes the downloader's `<output>.part` in-progress file.
#[derive(Debug)]
pub struct PartialOutput {
    path: PathBuf,
    armed: bool,
}

impl PartialOutput {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    /// Keep the output; nothing is removed on drop
    pub fn commit(mut self) {
        self.armed = false;
    }

    fn in_progress_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        for path in [self.path.clone(), self.in_progress_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed partial output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial output"),
            }
        }
    }
}
