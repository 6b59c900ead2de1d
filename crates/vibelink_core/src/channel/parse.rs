//! URL, HTML and feed parsing for channel resolution. No I/O.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

const CHANNEL_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[\w-]+$").expect("channel id pattern is valid"));

static META_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta itemprop="identifier" content="(UC[\w-]+)""#)
        .expect("meta identifier pattern is valid")
});

static EMBEDDED_CHANNEL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""channelId"\s*:\s*"(UC[\w-]+)""#).expect("embedded channel id pattern is valid")
});

static CANONICAL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="canonical" href="[^"]*/channel/(UC[\w-]+)""#)
        .expect("canonical link pattern is valid")
});

static FEED_ITEM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<yt:videoId>(.*?)</yt:videoId>").expect("feed item pattern is valid")
});

/// Whether `id` looks like a channel id (`UC` followed by word chars or dashes)
pub fn is_channel_id(id: &str) -> bool {
    CHANNEL_ID.is_match(id)
}

/// Parse `url` and keep it only if it points at the video platform.
pub fn supported_channel_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    CHANNEL_HOSTS.contains(&host.as_str()).then_some(parsed)
}

/// Channel id embedded in a `/channel/UC…` path.
pub fn channel_id_from_path(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "channel")?;
    let id = segments.next()?;
    is_channel_id(id).then(|| id.to_string())
}

/// Channel id advertised by a channel page.
///
/// Tries the `identifier` meta tag first, then the id embedded in page
/// data, then the canonical link.
pub fn channel_id_from_html(html: &str) -> Option<String> {
    [&*META_IDENTIFIER, &*EMBEDDED_CHANNEL_ID, &*CANONICAL_LINK]
        .iter()
        .find_map(|pattern| pattern.captures(html))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// First item id listed in a channel feed.
pub fn first_item_id(feed: &str) -> Option<String> {
    FEED_ITEM_ID
        .captures_iter(feed)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Feed URL for a channel id.
pub fn feed_url(base: &str, channel_id: &str) -> String {
    match Url::parse_with_params(base, &[("channel_id", channel_id)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{base}?channel_id={channel_id}"),
    }
}
