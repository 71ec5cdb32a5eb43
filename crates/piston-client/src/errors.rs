//! Error types for calls against the execution service
//!
//! Transport failures are split by what a caller can do about them: a non-success
//! status carries the service's own explanation verbatim, an exhausted rate limit
//! is reported separately so callers can back off at a higher level, and malformed
//! payloads are reported as decode failures rather than surfacing as missing data.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PistonError {
    #[error("request failed with status {status}: {body}")]
    Transport { status: u16, body: String },
    #[error("rate limit still exceeded after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
    #[error("Decoding error: {0}")]
    Decode(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PistonError {
    /// HTTP status of a transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            PistonError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of a transport failure
    pub fn body(&self) -> Option<&str> {
        match self {
            PistonError::Transport { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, PistonError::RateLimitExhausted { .. })
    }
}

impl From<reqwest::Error> for PistonError {
    fn from(err: reqwest::Error) -> Self {
        PistonError::Http(err.to_string())
    }
}
