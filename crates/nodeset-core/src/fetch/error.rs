use thiserror::Error;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request never produced a response. Retryable.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status. Not retried.
    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        FetchError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. } | FetchError::Status { url, .. } => url,
        }
    }
}
