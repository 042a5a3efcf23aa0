//! Error types for the DocBase client.
//!
//! # Design
//! Every layer of the request pipeline returns exactly one `Error` variant;
//! nothing is logged or swallowed on the way up. `RateLimit` is kept apart
//! from `Api` so callers can read the attached [`Rate`] and wait until its
//! reset time before retrying. All other non-success statuses land in `Api`
//! with whatever messages the server sent.

use std::path::PathBuf;

use thiserror::Error;

use crate::rate::Rate;

/// Failure reported by a [`Transport`](crate::transport::Transport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shorthand for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message used when a non-success response carries no usable error body.
pub const UNDECODABLE_ERROR_BODY: &str = "could not decode error body";

/// Errors returned by the client and its resource services.
#[derive(Debug, Error)]
pub enum Error {
    /// The base URL or a request path did not form a valid absolute URL.
    #[error("invalid url `{url}`: {reason}")]
    Url { url: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The transport failed before any HTTP response was received.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The request was rejected because the rate limit is exhausted.
    ///
    /// `status` is `Some(429)` when the server rejected the request and
    /// `None` when the local pre-check refused to send it.
    #[error("rate limit exceeded: {}", .messages.join("; "))]
    RateLimit {
        status: Option<u16>,
        rate: Rate,
        messages: Vec<String>,
    },

    /// The server answered with a non-success status other than 429.
    #[error("api error (status {status}): {}", .messages.join("; "))]
    Api {
        status: u16,
        error: Option<String>,
        messages: Vec<String>,
    },

    /// A success response body did not match the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// A local file could not be read for upload.
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Required configuration was missing or empty.
    #[error("missing configuration: {0}")]
    Config(String),
}

impl Error {
    /// The HTTP status associated with this error, if a response was seen.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RateLimit { status, .. } => *status,
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable messages carried by API and rate-limit errors.
    pub fn messages(&self) -> &[String] {
        match self {
            Error::RateLimit { messages, .. } | Error::Api { messages, .. } => messages,
            _ => &[],
        }
    }

    /// The rate-limit snapshot attached to a rate-limit error.
    pub fn rate(&self) -> Option<&Rate> {
        match self {
            Error::RateLimit { rate, .. } => Some(rate),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_joins_messages() {
        let err = Error::Api {
            status: 400,
            error: Some("bad_request".to_string()),
            messages: vec!["Title is empty".to_string(), "Body is empty".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "api error (status 400): Title is empty; Body is empty"
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.messages().len(), 2);
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn local_rate_limit_has_no_status() {
        let err = Error::RateLimit {
            status: None,
            rate: Rate::default(),
            messages: vec!["wait".to_string()],
        };
        assert_eq!(err.status(), None);
        assert!(err.is_rate_limited());
        assert_eq!(err.rate(), Some(&Rate::default()));
    }
}
