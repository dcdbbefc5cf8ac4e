//! Fathom: a depth-bounded concurrent web crawler
//!
//! This crate implements a breadth-first crawler engine that explores a link
//! graph layer by layer while bounding concurrent downloads globally, per
//! origin host, and concurrent link extraction work.

pub mod config;
pub mod crawler;
pub mod downloader;
#[cfg(test)]
pub mod test_support;
pub mod url;

use thiserror::Error;

/// Main error type for fathom operations
#[derive(Debug, Error)]
pub enum FathomError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Why a single URL could not be retrieved.
///
/// One of these is recorded in the failure map for every URL that was
/// scheduled but never successfully downloaded. Causes are stored by value
/// (stringly for transport errors) so the final report owns them outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("malformed URL: {0}")]
    Malformed(String),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("crawl task aborted: {0}")]
    Aborted(String),
}

impl From<UrlError> for FetchError {
    fn from(err: UrlError) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Result type alias for fathom operations
pub type Result<T> = std::result::Result<T, FathomError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler, DownloadOutcome};
pub use downloader::{Document, Downloader, HttpDownloader};
pub use crate::url::host_of;
