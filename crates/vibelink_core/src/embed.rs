//! Provider-specific embed extraction.
//!
//! Both transforms are pure: no network calls. When a URL cannot be turned
//! into an embeddable source they return `None` and the block is not rendered.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Length of a video token on the video platform
pub const VIDEO_ID_LEN: usize = 11;

const VIDEO_EMBED_BASE: &str = "https://www.youtube.com/embed/";
const AUDIO_HOST: &str = "open.spotify.com";

// The greedy prefix makes the last recognised marker win, e.g. the `v=` of a
// playlist URL rather than an earlier path segment.
static VIDEO_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("video id pattern is valid")
});

/// Extract the video token from a watch page, short link or embed URL.
///
/// Returns `None` unless the token is exactly [`VIDEO_ID_LEN`] characters.
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = VIDEO_ID_PATTERN.captures(url)?;
    let id = captures.get(2)?.as_str();
    (id.chars().count() == VIDEO_ID_LEN).then(|| id.to_string())
}

/// Embeddable player URL for a video token
pub fn video_embed_url(video_id: &str) -> String {
    format!("{VIDEO_EMBED_BASE}{video_id}")
}

/// Embeddable player URL for a watch-page URL
pub fn video_embed_src(url: &str) -> Option<String> {
    extract_video_id(url).map(|id| video_embed_url(&id))
}

/// Rewrite an audio share URL into its embeddable form.
///
/// `https://open.spotify.com/track/XYZ` becomes
/// `https://open.spotify.com/embed/track/XYZ`. Other hosts, bare host URLs and
/// unparseable input yield `None`.
pub fn audio_embed_src(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if parsed.host_str() != Some(AUDIO_HOST) {
        return None;
    }

    let path = parsed.path();
    if path.trim_matches('/').is_empty() {
        return None;
    }

    Some(format!("https://{AUDIO_HOST}/embed{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_and_embed_urls() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ")
                .as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_wrong_length_or_malformed() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(extract_video_id("https://example.com/video"), None);
        assert_eq!(extract_video_id("not even a url"), None);
        assert_eq!(video_embed_src("https://example.com/"), None);
    }

    #[test]
    fn test_video_embed_src() {
        assert_eq!(
            video_embed_src("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_audio_rewrite() {
        assert_eq!(
            audio_embed_src("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC").as_deref(),
            Some("https://open.spotify.com/embed/track/4uLU6hMCjMI75M1A2tKUQC")
        );
        assert_eq!(
            audio_embed_src("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3?si=abc")
                .as_deref(),
            Some("https://open.spotify.com/embed/album/1DFixLWuPkv3KT3TnV35m3")
        );
    }

    #[test]
    fn test_audio_rejects_other_hosts() {
        assert_eq!(audio_embed_src("https://soundcloud.com/artist/track"), None);
        assert_eq!(audio_embed_src("https://open.spotify.com/"), None);
        assert_eq!(audio_embed_src("open.spotify.com/track/x"), None);
    }
}
