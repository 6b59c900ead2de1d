//! Configuration types for the channel resolver.
//!
//! The server fills [`ResolverConfig`] from environment variables; anything
//! that deserializes (TOML, JSON) works too since every field has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default feed cache window: one hour
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default request timeout for page and feed fetches
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default feed endpoint; the channel id is appended as `channel_id`
pub const DEFAULT_FEED_BASE_URL: &str = "https://www.youtube.com/feeds/videos.xml";

/// Settings for [`crate::channel::ChannelResolver`] and its fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// How long a resolved feed item stays cached, in seconds
    pub cache_ttl_secs: u64,

    /// Network timeout for a single page or feed fetch, in seconds
    pub timeout_secs: u64,

    /// User agent sent with outbound requests
    pub user_agent: String,

    /// Feed endpoint (overridable for tests and mirrors)
    pub feed_base_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("vibelink/{}", env!("CARGO_PKG_VERSION")),
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Cache window as a `Duration`
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Fetch timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
