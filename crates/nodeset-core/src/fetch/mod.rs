//! Fetch capability used by the catalog and the loader.
//!
//! The core never talks to the network directly; it goes through a
//! [`Fetcher`]. [`HttpFetcher`] is the reqwest-backed implementation, tests
//! plug in their own.

mod error;
mod http;

pub use error::FetchError;
pub use http::HttpFetcher;

use async_trait::async_trait;

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub text: String,
}

impl FetchResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            text: text.into(),
        }
    }
}

/// Trait for retrieving remote documents and listings.
///
/// Implementations return `Ok` only for 2xx responses. Transport failures
/// are retried inside the implementation according to its policy and then
/// surface as [`FetchError::Transport`]; non-2xx responses are rejected at
/// once as [`FetchError::Status`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}
