//! Crawl coordination - the breadth-first frontier loop
//!
//! The coordinator owns the worker pools and drives traversal layer by
//! layer: it filters the frontier down to a batch of fresh URLs, schedules
//! one download per URL, waits for the whole layer at a barrier, then folds
//! the outcomes into the visited set, failure map, and next frontier. All
//! mutation of those structures happens here, on the caller's task, never
//! concurrently.

use crate::crawler::extractor::ExtractorPool;
use crate::crawler::scheduler::DownloadScheduler;
use crate::crawler::{CrawlReport, DownloadOutcome};
use crate::downloader::Downloader;
use crate::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// How long `close` waits for each pool to drain before abandoning work.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Breadth-limited concurrent crawler.
///
/// A crawler instance holds two long-lived worker pools (downloads and link
/// extraction) plus the per-host admission queues; all of them survive
/// across [`crawl`](Crawler::crawl) calls, so repeated crawls share
/// per-host throttling state. Construction is cheap and the instance is
/// fully shareable: `crawl` takes `&self` and concurrent crawls simply
/// compete for the same pools.
pub struct Crawler {
    scheduler: DownloadScheduler,
    download_slots: Arc<Semaphore>,
    extract_slots: Arc<Semaphore>,
    downloaders: usize,
    extractors: usize,
}

impl Crawler {
    /// Creates a crawler over the given downloader.
    ///
    /// # Arguments
    ///
    /// * `downloader` - Fetches pages on behalf of the engine
    /// * `downloaders` - Maximum concurrent downloads overall
    /// * `extractors` - Maximum concurrent link extractions
    /// * `per_host` - Maximum concurrent downloads per origin host
    ///
    /// # Panics
    ///
    /// Panics if any limit is zero; a zero-sized pool could never run
    /// anything.
    pub fn new(
        downloader: Arc<dyn Downloader>,
        downloaders: usize,
        extractors: usize,
        per_host: usize,
    ) -> Self {
        assert!(
            downloaders >= 1 && extractors >= 1 && per_host >= 1,
            "crawler limits must be at least 1 (downloaders={downloaders}, extractors={extractors}, per_host={per_host})"
        );

        let download_slots = Arc::new(Semaphore::new(downloaders));
        let extract_slots = Arc::new(Semaphore::new(extractors));
        let scheduler = DownloadScheduler::new(
            downloader,
            Arc::clone(&download_slots),
            ExtractorPool::new(Arc::clone(&extract_slots)),
            per_host,
        );

        Self {
            scheduler,
            download_slots,
            extract_slots,
            downloaders,
            extractors,
        }
    }

    /// Crawls the link graph reachable from `seed` up to `depth` layers.
    ///
    /// `depth` counts layers, so `depth = 1` downloads the seed alone and
    /// `depth = 0` does nothing. Every failure stays local to its URL; the
    /// report always covers whatever the crawl managed to do.
    pub async fn crawl(&self, seed: &str, depth: usize) -> CrawlReport {
        self.run(seed, depth, None).await
    }

    /// Like [`crawl`](Crawler::crawl), but restricted to an allow-list of
    /// hosts in `scheme://authority` form (see [`crate::url::host_of`]).
    ///
    /// URLs on other hosts are silently dropped: they appear in neither the
    /// downloaded list nor the failure map.
    pub async fn crawl_within(
        &self,
        seed: &str,
        depth: usize,
        allowed_hosts: &HashSet<String>,
    ) -> CrawlReport {
        self.run(seed, depth, Some(allowed_hosts)).await
    }

    async fn run(
        &self,
        seed: &str,
        depth: usize,
        allowed_hosts: Option<&HashSet<String>>,
    ) -> CrawlReport {
        let mut downloaded: Vec<String> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut errors: HashMap<String, FetchError> = HashMap::new();
        let mut frontier: HashSet<String> = HashSet::from([seed.to_string()]);

        tracing::info!(seed, depth, "starting crawl");

        for layer in 0..depth {
            // URLs rediscovered in earlier layers are already settled.
            let batch: Vec<String> = frontier
                .drain()
                .filter(|url| !visited.contains(url) && !errors.contains_key(url))
                .collect();
            if batch.is_empty() {
                break;
            }

            let last_layer = layer + 1 == depth;
            tracing::debug!(layer, urls = batch.len(), last_layer, "dispatching layer");

            // Snapshot for the extraction filter: anything visited, failed,
            // or already part of this layer need not be reported again.
            let mut seen: HashSet<String> =
                HashSet::with_capacity(visited.len() + errors.len() + batch.len());
            seen.extend(visited.iter().cloned());
            seen.extend(errors.keys().cloned());
            seen.extend(batch.iter().cloned());
            let seen = Arc::new(seen);

            let pending: Vec<_> = batch
                .iter()
                .map(|url| {
                    (
                        url.clone(),
                        self.scheduler.schedule(url, last_layer, &seen, allowed_hosts),
                    )
                })
                .collect();

            // Layer barrier: every outcome lands before any state mutates,
            // so nothing from this layer leaks into the next one early.
            let mut next = HashSet::new();
            for (url, outcome) in pending {
                match outcome.await {
                    Ok(DownloadOutcome::Downloaded { url, links }) => {
                        if visited.insert(url.clone()) {
                            downloaded.push(url);
                        }
                        next.extend(links);
                    }
                    Ok(DownloadOutcome::Failed { url, cause }) => {
                        tracing::debug!(url, %cause, "download failed");
                        // First failure wins; a later cause never overwrites.
                        errors.entry(url).or_insert(cause);
                    }
                    Ok(DownloadOutcome::Skipped { url }) => {
                        tracing::trace!(url, "host-filtered URL skipped");
                    }
                    Err(_) => {
                        // The job's result channel died (shutdown or a
                        // panicked worker). Surface it instead of silently
                        // shortening the crawl.
                        tracing::warn!(url, "download task lost, recording as aborted");
                        errors.entry(url).or_insert_with(|| {
                            FetchError::Aborted(
                                "result channel closed before completion".to_string(),
                            )
                        });
                    }
                }
            }

            frontier = next;
        }

        tracing::info!(
            downloaded = downloaded.len(),
            failed = errors.len(),
            "crawl complete"
        );

        CrawlReport { downloaded, errors }
    }

    /// Shuts the crawler down.
    ///
    /// Waits up to a fixed grace period per pool for in-flight work to
    /// drain, then closes the pool so nothing new can start. Work that does
    /// not finish in time is abandoned: its result channels drop and any
    /// still-running crawl records those URLs as aborted. Never fails;
    /// irregularities are logged. After `close` returns, `crawl` must not
    /// be called again.
    pub async fn close(&self) {
        self.shutdown_pool("download", &self.download_slots, self.downloaders)
            .await;
        self.shutdown_pool("extract", &self.extract_slots, self.extractors)
            .await;
    }

    async fn shutdown_pool(&self, name: &str, slots: &Arc<Semaphore>, size: usize) {
        // Holding every permit proves the pool is idle; keep them held
        // until the pool is closed so no new work slips in between.
        let drained =
            tokio::time::timeout(SHUTDOWN_GRACE, slots.acquire_many(size as u32)).await;

        match &drained {
            Ok(Ok(_)) => tracing::debug!(pool = name, "pool drained"),
            Ok(Err(_)) => tracing::debug!(pool = name, "pool already closed"),
            Err(_) => tracing::warn!(
                pool = name,
                grace = ?SHUTDOWN_GRACE,
                "pool did not drain within grace period, abandoning remaining work"
            ),
        }

        slots.close();
        drop(drained);
    }

    /// Number of host queues created so far.
    #[cfg(test)]
    pub(crate) fn host_queue_count(&self) -> usize {
        self.scheduler.host_count()
    }
}
