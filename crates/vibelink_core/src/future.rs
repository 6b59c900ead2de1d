//! Boxed futures for object-safe async ports.
//!
//! [`crate::store::DataStore`] and [`crate::channel::PageFetcher`] are used
//! behind `dyn` so the server can pick a backend at startup and tests can swap
//! in mocks. To keep them object-safe, all their methods return boxed futures.

use std::future::Future;
use std::pin::Pin;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with multi-threaded runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[cfg(test)]
pub(crate) fn block_on_test<F: Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}
