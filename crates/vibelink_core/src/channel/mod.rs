//! Channel latest-content resolution.
//!
//! A `channel_latest` block stores a channel page URL. [`ChannelResolver`]
//! turns it into the id of the channel's newest item:
//!
//! 1. URLs outside the video platform resolve to nothing.
//! 2. A `/channel/UC…` path yields the channel id without any network call.
//! 3. Otherwise the page HTML is fetched and scanned for the channel id.
//! 4. The channel feed is fetched (or read from the [`FeedCache`]) and its
//!    first item id is returned.
//!
//! Every failure along the way is a miss (`None`), never an error: the block
//! then shows its "not found" placeholder. Misses are not cached and nothing
//! is retried.

mod cache;
mod fetch;
mod parse;

pub use cache::{Clock, FeedCache, SystemClock};
#[cfg(all(not(target_arch = "wasm32"), feature = "http"))]
pub use fetch::ReqwestFetcher;
pub use fetch::{FetchError, PageFetcher};
pub use parse::{
    channel_id_from_html, channel_id_from_path, feed_url, first_item_id, is_channel_id,
    supported_channel_url,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::ResolverConfig;
use crate::embed::video_embed_url;

/// Newest item of a channel at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChannelLatestItem {
    /// Channel id (`UC…`)
    pub channel_id: String,
    /// Video token of the newest item
    pub item_id: String,
    /// When the feed was read
    #[ts(type = "string")]
    pub resolved_at: DateTime<Utc>,
}

impl ChannelLatestItem {
    /// Embeddable player URL for the item
    pub fn embed_src(&self) -> String {
        video_embed_url(&self.item_id)
    }
}

/// Resolves channel URLs to their newest item.
pub struct ChannelResolver {
    fetcher: Arc<dyn PageFetcher>,
    cache: FeedCache,
    feed_base_url: String,
}

impl ChannelResolver {
    /// Resolver using the wall clock for its cache.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &ResolverConfig) -> Self {
        Self::with_cache(fetcher, config, FeedCache::new(config.cache_ttl()))
    }

    /// Resolver with a caller-built cache (tests inject a manual clock here).
    pub fn with_cache(
        fetcher: Arc<dyn PageFetcher>,
        config: &ResolverConfig,
        cache: FeedCache,
    ) -> Self {
        Self {
            fetcher,
            cache,
            feed_base_url: config.feed_base_url.clone(),
        }
    }

    /// Feed cache (for stats and purging)
    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Channel id for a channel page URL, scraping the page if needed.
    pub async fn resolve_channel_id(&self, url: &str) -> Option<String> {
        let parsed = supported_channel_url(url)?;

        if let Some(id) = channel_id_from_path(&parsed) {
            return Some(id);
        }

        let html = match self.fetcher.fetch_text(parsed.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                log::debug!("Channel page fetch failed: {}", e);
                return None;
            }
        };

        let id = channel_id_from_html(&html);
        if id.is_none() {
            log::debug!("No channel id found on {}", parsed);
        }
        id
    }

    /// Newest item for a known channel id, served from cache when fresh.
    pub async fn latest_item_for_channel(&self, channel_id: &str) -> Option<ChannelLatestItem> {
        if !is_channel_id(channel_id) {
            return None;
        }

        if let Some(item) = self.cache.get(channel_id) {
            return Some(item);
        }

        let url = feed_url(&self.feed_base_url, channel_id);
        let feed = match self.fetcher.fetch_text(&url).await {
            Ok(feed) => feed,
            Err(e) => {
                log::warn!("Feed fetch failed for {}: {}", channel_id, e);
                return None;
            }
        };

        let item = ChannelLatestItem {
            channel_id: channel_id.to_string(),
            item_id: first_item_id(&feed)?,
            resolved_at: self.cache.now(),
        };
        self.cache.insert(item.clone());
        Some(item)
    }

    /// Newest item behind a channel page URL. `None` on any miss.
    pub async fn latest_item(&self, url: &str) -> Option<ChannelLatestItem> {
        let channel_id = self.resolve_channel_id(url).await?;
        self.latest_item_for_channel(&channel_id).await
    }
}
