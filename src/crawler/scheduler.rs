//! Download scheduling
//!
//! The scheduler is the admission-control front of the engine. For each URL
//! it resolves the origin host, rejects malformed URLs and hosts outside the
//! allow-list without touching any queue, finds or lazily creates the host's
//! admission queue, and submits the actual download job to it.

use crate::crawler::extractor::ExtractorPool;
use crate::crawler::host_queue::HostQueue;
use crate::crawler::DownloadOutcome;
use crate::downloader::Downloader;
use crate::url::host_of;
use crate::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Semaphore};

/// Accepts download requests and routes them through per-host queues.
///
/// The host→queue map lives for the whole crawler lifetime, so consecutive
/// crawls on one instance share per-host throttling state.
pub(crate) struct DownloadScheduler {
    downloader: Arc<dyn Downloader>,
    download_slots: Arc<Semaphore>,
    extractor: ExtractorPool,
    per_host: usize,
    host_queues: Mutex<HashMap<String, Arc<HostQueue>>>,
}

impl DownloadScheduler {
    pub(crate) fn new(
        downloader: Arc<dyn Downloader>,
        download_slots: Arc<Semaphore>,
        extractor: ExtractorPool,
        per_host: usize,
    ) -> Self {
        Self {
            downloader,
            download_slots,
            extractor,
            per_host,
            host_queues: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules one URL for download, returning its pending outcome.
    ///
    /// Malformed URLs and allow-list misses resolve immediately, consuming
    /// no host permit and creating no queue. Everything else is enqueued on
    /// the URL's host queue; the job downloads the page and, unless this is
    /// the crawl's last layer, hands the document to the extraction pool and
    /// waits for its filtered links before completing.
    pub(crate) fn schedule(
        &self,
        url: &str,
        last_layer: bool,
        seen: &Arc<HashSet<String>>,
        allowed_hosts: Option<&HashSet<String>>,
    ) -> oneshot::Receiver<DownloadOutcome> {
        let host = match host_of(url) {
            Ok(host) => host,
            Err(e) => {
                return completed(DownloadOutcome::Failed {
                    url: url.to_string(),
                    cause: e.into(),
                });
            }
        };

        if let Some(allowed) = allowed_hosts {
            if !allowed.contains(&host) {
                tracing::debug!(url, host, "host outside allow-list, skipping");
                return completed(DownloadOutcome::Skipped {
                    url: url.to_string(),
                });
            }
        }

        if self.download_slots.is_closed() {
            return completed(DownloadOutcome::Failed {
                url: url.to_string(),
                cause: FetchError::Aborted("crawler is shut down".to_string()),
            });
        }

        // Atomic get-or-create so two racing schedules for one host can
        // never end up with two queues.
        let queue = {
            let mut queues = self.host_queues.lock().unwrap();
            Arc::clone(
                queues
                    .entry(host)
                    .or_insert_with(|| Arc::new(HostQueue::new(self.per_host))),
            )
        };

        let downloader = Arc::clone(&self.downloader);
        let extractor = self.extractor.clone();
        let seen = Arc::clone(seen);
        let url = url.to_string();

        let job = Box::pin(async move {
            match downloader.download(&url).await {
                Ok(document) => {
                    let links = if last_layer {
                        Vec::new()
                    } else {
                        // An abandoned extraction (shutdown) reads as a page
                        // with no links, same as an extraction failure.
                        extractor.extract(document, seen).await.unwrap_or_default()
                    };
                    DownloadOutcome::Downloaded { url, links }
                }
                Err(cause) => DownloadOutcome::Failed { url, cause },
            }
        });

        queue.submit(&self.download_slots, job)
    }

    /// Number of host queues created so far.
    #[cfg(test)]
    pub(crate) fn host_count(&self) -> usize {
        self.host_queues.lock().unwrap().len()
    }
}

/// Wraps an already-known outcome as a resolved receiver.
fn completed(outcome: DownloadOutcome) -> oneshot::Receiver<DownloadOutcome> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(outcome);
    rx
}
