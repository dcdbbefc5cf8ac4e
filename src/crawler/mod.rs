//! Crawler engine
//!
//! This module contains the breadth-first crawl machinery:
//! - Per-host admission queues bounding concurrent downloads per origin
//! - A download scheduler owning the host→queue map and the download pool
//! - A bounded link-extraction pipeline
//! - The frontier coordinator driving layer-by-layer traversal

mod coordinator;
mod extractor;
mod host_queue;
mod scheduler;

pub use coordinator::Crawler;

use crate::FetchError;
use std::collections::HashMap;

/// The tagged result of attempting one URL.
///
/// Exactly one of these is produced per scheduled URL; `links` only carries
/// anything when the outcome is `Downloaded` and extraction was requested
/// for the layer.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The page was retrieved; `links` holds its filtered outbound links.
    Downloaded { url: String, links: Vec<String> },

    /// The page could not be retrieved.
    Failed { url: String, cause: FetchError },

    /// The URL's host is outside the allow-list; not an error.
    Skipped { url: String },
}

/// Final, immutable result of one crawl.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Successfully downloaded URLs, unique, in completion order.
    pub downloaded: Vec<String>,

    /// URL → cause for everything that was scheduled but failed.
    pub errors: HashMap<String, FetchError>,
}
