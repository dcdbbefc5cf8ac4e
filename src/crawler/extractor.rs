//! Link extraction pipeline
//!
//! Extraction runs on its own bounded pool, independent of the download
//! pool, so a slow page parse never pins a download slot for another host's
//! traffic. Failures here are deliberately non-fatal: a page that cannot
//! yield links is still a successfully downloaded page.

use crate::downloader::Document;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{oneshot, Semaphore};

/// Bounded worker pool turning downloaded documents into filtered link lists.
#[derive(Clone)]
pub(crate) struct ExtractorPool {
    slots: Arc<Semaphore>,
}

impl ExtractorPool {
    pub(crate) fn new(slots: Arc<Semaphore>) -> Self {
        Self { slots }
    }

    /// Queues link extraction for a downloaded document.
    ///
    /// The returned receiver resolves with the document's outbound links,
    /// minus everything in `seen` (URLs already visited, failed, or part of
    /// the current layer). Extraction failures resolve to an empty list; a
    /// dropped sender (pool closed during shutdown) surfaces as a receive
    /// error the caller treats the same way.
    pub(crate) fn extract(
        &self,
        document: Box<dyn Document>,
        seen: Arc<HashSet<String>>,
    ) -> oneshot::Receiver<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        let slots = Arc::clone(&self.slots);

        tokio::spawn(async move {
            let _permit = match slots.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let links = match document.extract_links().await {
                Ok(raw) => raw.into_iter().filter(|link| !seen.contains(link)).collect(),
                Err(e) => {
                    // Costs the page its links, never its downloaded status.
                    tracing::debug!(error = %e, "link extraction failed");
                    Vec::new()
                }
            };

            let _ = tx.send(links);
        });

        rx
    }
}
