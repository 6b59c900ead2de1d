//! Outbound page and feed fetching.

use thiserror::Error;

use crate::future::BoxFuture;

/// A fetch that produced no usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body read failure
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying error
        message: String,
    },

    /// The server answered with a non-success status
    #[error("Request to {url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request did not finish within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },
}

/// Port for unauthenticated GETs of HTML pages and XML feeds.
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body as text.
    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

#[cfg(all(not(target_arch = "wasm32"), feature = "http"))]
pub use reqwest_fetcher::ReqwestFetcher;

#[cfg(all(not(target_arch = "wasm32"), feature = "http"))]
mod reqwest_fetcher {
    use super::{FetchError, PageFetcher};
    use crate::config::ResolverConfig;
    use crate::future::BoxFuture;

    /// [`PageFetcher`] backed by an async `reqwest` client.
    #[derive(Debug, Clone)]
    pub struct ReqwestFetcher {
        client: reqwest::Client,
    }

    impl ReqwestFetcher {
        /// Build a client with the configured timeout and user agent.
        pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| FetchError::Transport {
                    url: String::new(),
                    message: format!("failed to build HTTP client: {e}"),
                })?;
            Ok(Self { client })
        }

        async fn get(&self, url: &str) -> Result<String, FetchError> {
            let map_err = |e: reqwest::Error| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            };

            let response = self.client.get(url).send().await.map_err(map_err)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(map_err)
        }
    }

    impl PageFetcher for ReqwestFetcher {
        fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
            Box::pin(self.get(url))
        }
    }
}
