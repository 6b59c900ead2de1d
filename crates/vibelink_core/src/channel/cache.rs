//! Time-boxed cache of resolved feed items, keyed by channel id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::ChannelLatestItem;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Feed results cached for a fixed window.
///
/// Entries expire `ttl` after they were stored. Expired entries are dropped
/// lazily on lookup or in bulk with [`FeedCache::purge_expired`]. Locks are
/// only held for the map operation itself.
pub struct FeedCache {
    entries: RwLock<HashMap<String, ChannelLatestItem>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl FeedCache {
    /// Cache with the given window, using the wall clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache with an injected clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Cache window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn is_fresh(&self, item: &ChannelLatestItem, now: DateTime<Utc>) -> bool {
        match (now - item.resolved_at).to_std() {
            Ok(age) => age < self.ttl,
            // Stored "in the future" (clock moved back): keep it
            Err(_) => true,
        }
    }

    /// Fresh entry for `channel_id`, if any.
    pub fn get(&self, channel_id: &str) -> Option<ChannelLatestItem> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().ok()?;
            let item = entries.get(channel_id)?;
            if self.is_fresh(item, now) {
                return Some(item.clone());
            }
        }

        if let Ok(mut entries) = self.entries.write() {
            entries.remove(channel_id);
        }
        None
    }

    /// Store a resolved item. Its `resolved_at` is the start of its window.
    pub fn insert(&self, item: ChannelLatestItem) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(item.channel_id.clone(), item);
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, item| self.is_fresh(item, now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
