//! Test doubles for the data-store, fetcher and clock ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::channel::{Clock, FetchError, PageFetcher};
use crate::error::{Result, VibelinkError};
use crate::future::BoxFuture;
use crate::store::{BlockRow, DataStore, MemoryDataStore};

/// Fetcher serving canned bodies. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl PageFetcher for MockFetcher {
    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, std::result::Result<String, FetchError>> {
        self.calls.lock().unwrap().push(url.to_string());
        let result = self.pages.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        });
        Box::pin(std::future::ready(result))
    }
}

/// Data store where every call fails with a transport error.
pub struct FailingDataStore;

fn unavailable<T>() -> BoxFuture<'static, Result<T>>
where
    T: Send + 'static,
{
    Box::pin(std::future::ready(Err(VibelinkError::Store(
        "connection refused".into(),
    ))))
}

impl DataStore for FailingDataStore {
    fn select_by_owner<'a>(&'a self, _owner_id: &'a str) -> BoxFuture<'a, Result<Vec<BlockRow>>> {
        unavailable()
    }

    fn select_by_id<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, Result<Option<BlockRow>>> {
        unavailable()
    }

    fn insert<'a>(&'a self, _row: &'a BlockRow) -> BoxFuture<'a, Result<()>> {
        unavailable()
    }

    fn update<'a>(&'a self, _row: &'a BlockRow) -> BoxFuture<'a, Result<bool>> {
        unavailable()
    }

    fn delete<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, Result<bool>> {
        unavailable()
    }

    fn update_positions<'a>(
        &'a self,
        _owner_id: &'a str,
        _positions: &'a [(String, i64)],
    ) -> BoxFuture<'a, Result<()>> {
        unavailable()
    }

    fn increment_interactions<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, Result<()>> {
        unavailable()
    }
}

/// In-memory store that can be switched into failing mode.
#[derive(Default)]
pub struct FlakyDataStore {
    inner: MemoryDataStore,
    failing: AtomicBool,
}

impl FlakyDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.failing.load(Ordering::SeqCst)
    }
}

impl DataStore for FlakyDataStore {
    fn select_by_owner<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<BlockRow>>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.select_by_owner(owner_id)
    }

    fn select_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<BlockRow>>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.select_by_id(id)
    }

    fn insert<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<()>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.insert(row)
    }

    fn update<'a>(&'a self, row: &'a BlockRow) -> BoxFuture<'a, Result<bool>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.update(row)
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<bool>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.delete(id)
    }

    fn update_positions<'a>(
        &'a self,
        owner_id: &'a str,
        positions: &'a [(String, i64)],
    ) -> BoxFuture<'a, Result<()>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.update_positions(owner_id, positions)
    }

    fn increment_interactions<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        if self.is_failing() {
            return unavailable();
        }
        self.inner.increment_interactions(id)
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
