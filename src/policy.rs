// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::listing::ChannelItem;
use crate::media::{MediaMode, generate_filename};
use crate::state::SyncState;

/// What to do with one listing item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Resolve and fetch the item
    Materialize,
    /// Output already on disk; record it without fetching
    SkipExisting,
    /// Already tried earlier in this run
    SkipAttempted,
    /// Already mirrored; nothing to do, and no page after this one is needed
    SkipKnown,
    /// Older than the cutoff; stop the whole walk
    StopCutoff,
}

/// Decision for one item, plus whether the rest of the page overlaps the
/// mirrored set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// A later item on the same page is already known
    pub lookahead_hit: bool,
}

/// Why the walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The listing ran out of pages
    Exhausted,
    /// Reached items that are already mirrored
    CaughtUp,
    /// Reached an item older than the cutoff
    Cutoff,
    /// Hit the per-run download limit
    Limit,
    /// A listing page could not be fetched
    ListingFailed,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Exhausted => "end of channel",
            Self::CaughtUp => "caught up with mirrored items",
            Self::Cutoff => "reached cutoff date",
            Self::Limit => "download limit reached",
            Self::ListingFailed => "listing fetch failed",
        };
        f.write_str(text)
    }
}

/// Per-item stop/skip rules.
///
/// Both stopping rules (cutoff, known item on the page) assume the listing is
/// strictly newest first. Only the cutoff ends the walk mid-page.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    mode: MediaMode,
    cutoff: Option<DateTime<Utc>>,
    output_dir: PathBuf,
}

impl SyncPolicy {
    pub fn new(mode: MediaMode, cutoff: Option<DateTime<Utc>>, output_dir: &Path) -> Self {
        Self {
            mode,
            cutoff,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    /// Prospective output basename for an item
    pub fn basename_for(&self, item: &ChannelItem) -> String {
        generate_filename(item, self.mode)
    }

    pub fn output_path_for(&self, item: &ChannelItem) -> PathBuf {
        self.output_dir.join(self.basename_for(item))
    }

    fn is_known(&self, state: &SyncState, item: &ChannelItem) -> bool {
        state.is_known(&item.source_url, &self.basename_for(item))
    }

    /// True if any of `remainder` is already known
    pub fn lookahead_hit(&self, state: &SyncState, remainder: &[ChannelItem]) -> bool {
        remainder.iter().any(|item| self.is_known(state, item))
    }

    /// True if the item is older than the configured cutoff. Undated items
    /// never are.
    pub fn is_past_cutoff(&self, item: &ChannelItem) -> bool {
        match (self.cutoff, item.published()) {
            (Some(cutoff), Some(published)) => published < cutoff,
            _ => false,
        }
    }

    /// Decide what to do with `items[index]`
    pub fn decide(&self, state: &SyncState, items: &[ChannelItem], index: usize) -> Decision {
        let item = &items[index];
        let lookahead_hit = self.lookahead_hit(state, &items[index + 1..]);

        let verdict = if self.is_past_cutoff(item) {
            Verdict::StopCutoff
        } else if self.is_known(state, item) {
            Verdict::SkipKnown
        } else if state.was_attempted(&item.source_url) {
            Verdict::SkipAttempted
        } else if self.output_path_for(item).exists() {
            Verdict::SkipExisting
        } else {
            Verdict::Materialize
        };

        Decision {
            verdict,
            lookahead_hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheRecord;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn make_item(title: &str, published_at: Option<i64>) -> ChannelItem {
        ChannelItem {
            title: title.to_string(),
            published_at,
            source_url: format!("https://x.test/@c/{title}"),
        }
    }

    fn known_state(source: &str, file: &str) -> SyncState {
        SyncState::from_records(vec![CacheRecord {
            title: file.to_string(),
            output_file: PathBuf::from("/mirror").join(file),
            feed_url: String::new(),
            published_at: None,
            description: String::new(),
            source_url: source.to_string(),
        }])
    }

    #[test]
    fn cutoff_compares_against_midnight() {
        let cutoff = DateTime::from_timestamp(day(2023, 1, 2), 0);
        let policy = SyncPolicy::new(MediaMode::Video, cutoff, Path::new("/mirror"));

        assert!(!policy.is_past_cutoff(&make_item("a", Some(day(2023, 6, 1)))));
        assert!(!policy.is_past_cutoff(&make_item("b", Some(day(2023, 1, 2)))));
        assert!(policy.is_past_cutoff(&make_item("c", Some(day(2023, 1, 1)))));
        assert!(!policy.is_past_cutoff(&make_item("d", None)));
    }

    #[test]
    fn no_cutoff_never_stops() {
        let policy = SyncPolicy::new(MediaMode::Video, None, Path::new("/mirror"));
        assert!(!policy.is_past_cutoff(&make_item("old", Some(0))));
    }

    #[test]
    fn known_source_url_is_skipped() {
        let dir = tempdir().unwrap();
        let policy = SyncPolicy::new(MediaMode::Video, None, dir.path());
        let items = vec![make_item("new", None), make_item("old", None)];
        let state = known_state("https://x.test/@c/old", "whatever.mp4");

        let first = policy.decide(&state, &items, 0);
        assert_eq!(first.verdict, Verdict::Materialize);
        assert!(first.lookahead_hit);

        let second = policy.decide(&state, &items, 1);
        assert_eq!(second.verdict, Verdict::SkipKnown);
        assert!(!second.lookahead_hit);
    }

    #[test]
    fn known_basename_counts_as_known() {
        let dir = tempdir().unwrap();
        let policy = SyncPolicy::new(MediaMode::Audio, None, dir.path());
        let items = vec![make_item("fresh", None), make_item("Re: upload?", None)];
        let state = known_state("https://elsewhere.test/1", "Re_ upload_.mp3");

        assert!(policy.decide(&state, &items, 0).lookahead_hit);
        assert_eq!(policy.decide(&state, &items, 1).verdict, Verdict::SkipKnown);

        // Different mode means a different basename
        let video = SyncPolicy::new(MediaMode::Video, None, dir.path());
        assert!(!video.decide(&state, &items, 0).lookahead_hit);
    }

    #[test]
    fn existing_file_is_skipped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("on disk.mp4"), b"x").unwrap();
        let policy = SyncPolicy::new(MediaMode::Video, None, dir.path());
        let items = vec![make_item("on disk", None)];

        let decision = policy.decide(&SyncState::default(), &items, 0);
        assert_eq!(decision.verdict, Verdict::SkipExisting);
    }

    #[test]
    fn attempted_item_is_skipped() {
        let dir = tempdir().unwrap();
        let policy = SyncPolicy::new(MediaMode::Video, None, dir.path());
        let items = vec![make_item("flaky", None)];
        let mut state = SyncState::default();
        state.mark_attempted("https://x.test/@c/flaky");

        assert_eq!(
            policy.decide(&state, &items, 0).verdict,
            Verdict::SkipAttempted
        );
    }

    #[test]
    fn cutoff_takes_precedence_over_known() {
        let dir = tempdir().unwrap();
        let cutoff = DateTime::from_timestamp(day(2023, 1, 2), 0);
        let policy = SyncPolicy::new(MediaMode::Video, cutoff, dir.path());
        let items = vec![make_item("old", Some(day(2022, 1, 1)))];
        let state = known_state("https://x.test/@c/old", "old.mp4");

        assert_eq!(policy.decide(&state, &items, 0).verdict, Verdict::StopCutoff);
    }

    #[test]
    fn output_path_joins_sanitized_name() {
        let policy = SyncPolicy::new(MediaMode::Audio, None, Path::new("/mirror"));
        assert_eq!(
            policy.output_path_for(&make_item("a/b", None)),
            PathBuf::from("/mirror/a_b.mp3")
        );
    }
}
