use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed with status {status}: {body}")]
    FetchFailed { status: u16, body: String },

    #[error("Rate limited by the comments API")]
    RateLimited,

    #[error("Detail unavailable for comment {id}: {reason}")]
    DetailUnavailable { id: String, reason: String },

    #[error("Failed to persist {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which backoff schedule a retryable failure falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    RateLimited,
    Transient,
}

impl Error {
    pub fn retry_kind(&self) -> Option<RetryKind> {
        match self {
            Error::RateLimited => Some(RetryKind::RateLimited),
            Error::Network(e) if e.is_timeout() || e.is_connect() || e.is_body() => {
                Some(RetryKind::Transient)
            }
            Error::FetchFailed { status, .. } if *status >= 500 => Some(RetryKind::Transient),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry_kind().is_some()
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Persistence {
            path: path.into(),
            source,
        }
    }
}
