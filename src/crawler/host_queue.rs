//! Per-host admission queue
//!
//! Every origin host gets one of these: a FIFO of pending download jobs
//! gated by a pool of `per_host` permits. A job only runs once it holds both
//! a host permit and a slot in the global download pool, so downloads are
//! bounded per host and globally at the same time.

use crate::crawler::DownloadOutcome;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Semaphore};

/// A pending download: the work to run and the channel its outcome resolves.
type DownloadJob = (
    Pin<Box<dyn Future<Output = DownloadOutcome> + Send>>,
    oneshot::Sender<DownloadOutcome>,
);

/// FIFO task queue for one host, throttled by `per_host` permits.
///
/// Jobs for one host start in submission order. A drain worker picks up the
/// queue head whenever a host permit is free, occupies one global download
/// slot while it works, and keeps draining until the queue is empty.
pub(crate) struct HostQueue {
    pending: Mutex<VecDeque<DownloadJob>>,
    slots: Arc<Semaphore>,
}

impl HostQueue {
    pub(crate) fn new(per_host: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            slots: Arc::new(Semaphore::new(per_host)),
        }
    }

    /// Submits a job for this host.
    ///
    /// The returned receiver resolves with the job's outcome. If the crawler
    /// shuts down before the job runs, the sender is dropped and the
    /// receiver yields an error instead.
    pub(crate) fn submit(
        self: Arc<Self>,
        pool: &Arc<Semaphore>,
        job: Pin<Box<dyn Future<Output = DownloadOutcome> + Send>>,
    ) -> oneshot::Receiver<DownloadOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push_back((job, tx));
        self.dispatch(pool);
        rx
    }

    /// Starts a drain worker if a host permit is currently free.
    ///
    /// If none is free the job just waits in the queue; a finishing worker
    /// re-dispatches, so it will be picked up when a permit recycles.
    fn dispatch(self: Arc<Self>, pool: &Arc<Semaphore>) {
        let Ok(slot) = Arc::clone(&self.slots).try_acquire_owned() else {
            return;
        };

        let pool = Arc::clone(pool);
        tokio::spawn(async move {
            // The worker counts against the global download pool for as
            // long as it drains this host's queue.
            let worker = match Arc::clone(&pool).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // Pool closed mid-shutdown: drop queued jobs so their
                    // receivers resolve with an error instead of hanging.
                    self.pending.lock().unwrap().clear();
                    return;
                }
            };

            loop {
                let job = self.pending.lock().unwrap().pop_front();
                let Some((task, done)) = job else { break };
                let outcome = task.await;
                let _ = done.send(outcome);
            }

            drop(worker);
            drop(slot);

            // A submission can race with this worker's exit: it pushes after
            // the final pop but fails try_acquire before the permit returns.
            // Re-check so that job is not stranded.
            if !self.pending.lock().unwrap().is_empty() {
                self.dispatch(&pool);
            }
        });
    }
}
