//! Scripted downloader for crawler tests
//!
//! Serves an in-memory link graph instead of the network, with optional
//! artificial latency, and records the concurrency high-water marks the
//! engine's throttling guarantees are asserted against.

use crate::downloader::{Document, Downloader};
use crate::url::host_of;
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted page.
enum Page {
    Serve { links: Vec<String>, broken_links: bool },
    Fail(FetchError),
}

/// Builder for a scripted site.
#[derive(Default)]
pub struct ScriptedSite {
    pages: HashMap<String, Page>,
    latency: Duration,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page that downloads successfully and links to `links`.
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Serve {
                links: links.iter().map(|l| l.to_string()).collect(),
                broken_links: false,
            },
        );
        self
    }

    /// Adds a page whose download fails with `cause`.
    pub fn failing_page(mut self, url: &str, cause: FetchError) -> Self {
        self.pages.insert(url.to_string(), Page::Fail(cause));
        self
    }

    /// Adds a page that downloads fine but fails link extraction.
    pub fn page_with_broken_links(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Serve {
                links: Vec::new(),
                broken_links: true,
            },
        );
        self
    }

    /// Makes every download and extraction take this long, so concurrent
    /// work actually overlaps and high-water marks mean something.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn build(self) -> (Arc<ScriptedDownloader>, Arc<Stats>) {
        let stats = Arc::new(Stats::default());
        let downloader = Arc::new(ScriptedDownloader {
            pages: self.pages,
            latency: self.latency,
            stats: Arc::clone(&stats),
        });
        (downloader, stats)
    }
}

/// Concurrency and call accounting shared with the test body.
#[derive(Default)]
pub struct Stats {
    inner: Mutex<StatsInner>,
}

#[derive(Default)]
struct StatsInner {
    active_per_host: HashMap<String, usize>,
    peak_per_host: HashMap<String, usize>,
    active_global: usize,
    peak_global: usize,
    active_extractions: usize,
    peak_extractions: usize,
    extractions: usize,
    downloads: Vec<String>,
}

impl Stats {
    /// How many times `url` was requested from the downloader.
    pub fn download_count(&self, url: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .downloads
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    /// Highest number of simultaneous downloads observed for `host`.
    pub fn host_peak(&self, host: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .peak_per_host
            .get(host)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of simultaneous downloads observed overall.
    pub fn global_peak(&self) -> usize {
        self.inner.lock().unwrap().peak_global
    }

    /// Highest number of simultaneous link extractions observed.
    pub fn extraction_peak(&self) -> usize {
        self.inner.lock().unwrap().peak_extractions
    }

    /// Total number of link extractions performed.
    pub fn extraction_count(&self) -> usize {
        self.inner.lock().unwrap().extractions
    }

    fn download_started(&self, url: &str, host: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.downloads.push(url.to_string());

        let active = {
            let entry = inner.active_per_host.entry(host.to_string()).or_default();
            *entry += 1;
            *entry
        };
        let peak = inner.peak_per_host.entry(host.to_string()).or_default();
        *peak = (*peak).max(active);

        inner.active_global += 1;
        inner.peak_global = inner.peak_global.max(inner.active_global);
    }

    fn download_finished(&self, host: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(active) = inner.active_per_host.get_mut(host) {
            *active -= 1;
        }
        inner.active_global -= 1;
    }

    fn extraction_started(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.extractions += 1;
        inner.active_extractions += 1;
        inner.peak_extractions = inner.peak_extractions.max(inner.active_extractions);
    }

    fn extraction_finished(&self) {
        self.inner.lock().unwrap().active_extractions -= 1;
    }
}

/// In-memory [`Downloader`] over a scripted link graph.
pub struct ScriptedDownloader {
    pages: HashMap<String, Page>,
    latency: Duration,
    stats: Arc<Stats>,
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let host = host_of(url).map_err(FetchError::from)?;

        self.stats.download_started(url, &host);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.stats.download_finished(&host);

        match self.pages.get(url) {
            Some(Page::Serve { links, broken_links }) => Ok(Box::new(ScriptedDocument {
                links: links.clone(),
                broken: *broken_links,
                latency: self.latency,
                stats: Arc::clone(&self.stats),
            })),
            Some(Page::Fail(cause)) => Err(cause.clone()),
            None => Err(FetchError::HttpStatus { status: 404 }),
        }
    }
}

/// Document served by [`ScriptedDownloader`].
pub struct ScriptedDocument {
    links: Vec<String>,
    broken: bool,
    latency: Duration,
    stats: Arc<Stats>,
}

#[async_trait]
impl Document for ScriptedDocument {
    async fn extract_links(&self) -> Result<Vec<String>, FetchError> {
        self.stats.extraction_started();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.stats.extraction_finished();

        if self.broken {
            return Err(FetchError::Network("document truncated".to_string()));
        }
        Ok(self.links.clone())
    }
}
