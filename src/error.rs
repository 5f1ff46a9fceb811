//! Error types for imagery-dl
//!
//! Two layers of errors live here:
//! - [`Error`] covers fatal setup and reporting failures (bad configuration,
//!   unreadable catalog store, unwritable report). These reach the caller.
//! - [`StrategyError`] covers everything that can go wrong while a single
//!   source tries to produce an image. These never leave a strategy: they are
//!   logged and collapsed into a plain "not found" so the next source is tried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for imagery-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for imagery-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.concurrency")
        key: Option<String>,
    },

    /// Catalog store operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be set up
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Catalog store errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Failure of a single image source for a single identifier
///
/// The resolver never inspects the variant: any of them means "try the next
/// source". The variant only exists so logs can tell a vendor site that moved
/// its markup (`Parse`) apart from one that is down (`Network`).
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Connection failure, timeout or non-2xx status
    #[error("network error fetching {url}: {reason}")]
    Network {
        /// The URL being fetched
        url: String,
        /// Underlying cause
        reason: String,
        /// HTTP status when the server answered
        status: Option<u16>,
        /// Whether the client gave up waiting
        timeout: bool,
    },

    /// Expected structure absent from an HTML or JSON response
    #[error("unexpected response from {url}: {reason}")]
    Parse {
        /// The URL whose response could not be interpreted
        url: String,
        /// What was missing
        reason: String,
    },

    /// Well-formed response with no matching image
    #[error("no image found: {0}")]
    NotFound(String),

    /// Writing the image to the local directory failed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StrategyError {
    /// Build a network error from a reqwest failure
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        StrategyError::Network {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            timeout: err.is_timeout(),
            reason: err.to_string(),
        }
    }

    /// Build a network error for a response with a non-success status
    pub fn bad_status(url: &str, status: reqwest::StatusCode) -> Self {
        StrategyError::Network {
            url: url.to_string(),
            reason: format!("HTTP {}", status.as_u16()),
            status: Some(status.as_u16()),
            timeout: false,
        }
    }

    /// Build a parse error
    pub fn parse(url: &str, reason: impl Into<String>) -> Self {
        StrategyError::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable label, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyError::Network { .. } => "network",
            StrategyError::Parse { .. } => "parse",
            StrategyError::NotFound(_) => "not_found",
            StrategyError::Io { .. } => "io",
        }
    }
}
