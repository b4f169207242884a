// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::listing::ChannelItem;

/// Maximum length in bytes for the title portion of a filename
const MAX_STEM_BYTES: usize = 200;

/// Stem used when a title sanitizes down to nothing
const FALLBACK_STEM: &str = "untitled";

/// What the external tool should produce for each item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMode {
    /// Best audio stream, converted to mp3
    Audio,
    /// Best video merged with best audio into mp4
    Video,
}

impl MediaMode {
    pub fn from_audio_only(audio_only: bool) -> Self {
        if audio_only { Self::Audio } else { Self::Video }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }
}

/// Generate the output filename for an item
///
/// Deterministic for a given title and mode; the basename is also the dedup key
/// for items whose source URL is not yet known.
pub fn generate_filename(item: &ChannelItem, mode: MediaMode) -> String {
    format!("{}.{}", sanitize_title(&item.title), mode.extension())
}

/// Replace characters that are unsafe in filenames with `_`
pub fn sanitize_title(title: &str) -> String {
    let options = sanitize_filename::Options {
        windows: true,
        truncate: false,
        replacement: "_",
    };

    let sanitized = sanitize_filename::sanitize_with_options(title.trim(), options);
    let truncated = truncate_at_char_boundary(&sanitized, MAX_STEM_BYTES);

    if truncated.trim().is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        truncated.to_string()
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(title: &str) -> ChannelItem {
        ChannelItem {
            title: title.to_string(),
            published_at: None,
            source_url: "https://x.test/@c/item".to_string(),
        }
    }

    #[test]
    fn sanitize_replaces_colon_slash_question_mark() {
        assert_eq!(sanitize_title("a:b/c?d"), "a_b_c_d");
    }

    #[test]
    fn sanitize_replaces_each_char_individually() {
        assert_eq!(sanitize_title("What?? Now: 1/2"), "What__ Now_ 1_2");
    }

    #[test]
    fn sanitize_is_deterministic() {
        let title = "Q&A: why/how?";
        assert_eq!(sanitize_title(title), sanitize_title(title));
    }

    #[test]
    fn sanitize_preserves_unicode_and_spaces() {
        assert_eq!(sanitize_title("Café résumé"), "Café résumé");
    }

    #[test]
    fn sanitize_replaces_other_reserved_chars() {
        assert_eq!(sanitize_title(r#"a<b>c"d|e*f\g"#), "a_b_c_d_e_f_g");
    }

    #[test]
    fn sanitize_falls_back_for_empty_titles() {
        assert_eq!(sanitize_title(""), "untitled");
        assert_eq!(sanitize_title("   "), "untitled");
    }

    #[test]
    fn truncate_keeps_char_boundaries() {
        let long = "é".repeat(150); // 300 bytes
        let stem = sanitize_title(&long);
        assert!(stem.len() <= MAX_STEM_BYTES);
        assert!(stem.chars().all(|c| c == 'é'));
    }

    #[test]
    fn truncate_preserves_short_strings() {
        assert_eq!(truncate_at_char_boundary("short", 100), "short");
    }

    #[test]
    fn filename_uses_mode_extension() {
        let item = make_item("Episode 1: Pilot");
        assert_eq!(
            generate_filename(&item, MediaMode::Audio),
            "Episode 1_ Pilot.mp3"
        );
        assert_eq!(
            generate_filename(&item, MediaMode::Video),
            "Episode 1_ Pilot.mp4"
        );
    }

    #[test]
    fn mode_from_audio_only_flag() {
        assert_eq!(MediaMode::from_audio_only(true), MediaMode::Audio);
        assert_eq!(MediaMode::from_audio_only(false), MediaMode::Video);
    }
}
