//! Error handling - one taxonomy for the whole request pipeline

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Solidi client error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, including absent credentials on a private route
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed secret (not valid base64 where the scheme requires it)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// No response within the deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// DNS/connection/TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response carrying `{error, message}` or a non-2xx status
    #[error("API error (HTTP {status}): {error}{}", .message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Api {
        status: u16,
        error: String,
        message: Option<String>,
        raw: String,
    },

    /// Response body was not JSON
    #[error("Decode error (HTTP {status}): body is not valid JSON")]
    Decode { status: u16, raw: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Raw response text attached to API and decode errors.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::Api { raw, .. } | Error::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::Config(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
