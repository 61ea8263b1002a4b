use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{FetchError, FetchResponse, Fetcher};
use crate::config::FetchConfig;

/// HTTP fetcher with fixed-interval retry on transport failure.
///
/// A request is attempted once plus up to `max_retries` more times, pausing
/// `retry_interval` between attempts. Only transport errors (connect, timeout,
/// broken body) are retried; any non-2xx status fails immediately.
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    retry_interval: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(&FetchConfig::default())
    }

    /// Creates a fetcher from configuration.
    pub fn with_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::transport("<client>", e.to_string()))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_interval: config.retry_interval(),
        })
    }

    /// Sets the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the pause between retries.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    async fn send_request(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, e.to_string()))?;

        Ok(FetchResponse {
            status: status.as_u16(),
            text,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut attempt = 0;
        loop {
            match self.send_request(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Fetching {} failed ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        attempt,
                        self.max_retries,
                        self.retry_interval
                    );
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
