//! Page download collaborators
//!
//! The crawler engine is generic over how pages are actually fetched and how
//! links are pulled out of them. This module defines that seam:
//! - [`Downloader`] fetches one URL and yields a [`Document`]
//! - [`Document`] lazily extracts the page's outbound links
//!
//! [`HttpDownloader`] is the production implementation on top of reqwest and
//! scraper; tests substitute scripted implementations.

mod http;

pub use http::{build_http_client, HttpDocument, HttpDownloader};

use crate::FetchError;
use async_trait::async_trait;

/// Fetches pages for the crawler.
///
/// Implementations must be shareable across worker tasks; the engine clones
/// an `Arc<dyn Downloader>` into every download job.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads a single URL, yielding the fetched document.
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError>;
}

/// A successfully downloaded page whose links can be extracted on demand.
///
/// Extraction is a separate, possibly expensive step; the engine runs it on
/// its own worker pool so a slow extraction never occupies a download slot.
#[async_trait]
pub trait Document: Send + Sync {
    /// Extracts the raw outbound links of this page as absolute URLs.
    async fn extract_links(&self) -> Result<Vec<String>, FetchError>;
}
