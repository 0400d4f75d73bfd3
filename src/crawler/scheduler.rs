//! Bounded worker pool for page fetches
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Spawning one isolated task per page
//! - Abandoning queued and in-flight pages on cancellation

use crate::crawler::fetcher::PageFetcher;
use crate::state::PageResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Runs page fetches with at most `size` in flight
///
/// Pages may be submitted all at once; each task waits for a permit before
/// opening its rendering session. Results come back in completion order.
pub struct WorkerPool {
    /// Global semaphore for limiting concurrent fetches
    permits: Arc<Semaphore>,

    size: usize,

    /// Fetches currently holding a permit
    active: Arc<AtomicUsize>,

    tasks: JoinSet<Option<PageResult>>,
}

impl WorkerPool {
    /// Creates a pool of `size` workers (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            active: Arc::new(AtomicUsize::new(0)),
            tasks: JoinSet::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of fetches currently running
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of submitted pages not yet collected
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Queues one page
    ///
    /// The task yields `None` if `cancel` fires before the page finishes.
    pub fn submit(&mut self, page: u32, fetcher: PageFetcher, cancel: CancellationToken) {
        let permits = Arc::clone(&self.permits);
        let active = Arc::clone(&self.active);

        self.tasks.spawn(async move {
            let permit = tokio::select! {
                _ = cancel.cancelled() => return None,
                permit = permits.acquire_owned() => permit.ok()?,
            };

            active.fetch_add(1, Ordering::SeqCst);
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Page {} abandoned on cancellation", page);
                    None
                }
                result = fetcher.fetch_page(page) => Some(result),
            };
            active.fetch_sub(1, Ordering::SeqCst);

            drop(permit);
            result
        });
    }

    /// Waits for the next finished page
    ///
    /// Returns `None` once every submitted page has been collected.
    pub async fn join_next(&mut self) -> Option<Result<Option<PageResult>, JoinError>> {
        self.tasks.join_next().await
    }
}
