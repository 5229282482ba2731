use thiserror::Error;

/// Failure at the HTTP seam, classified so callers can decide whether to retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Rate limits, server errors and dropped connections are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RateLimited | FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidUrl(_) | FetchError::Decode(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}
