//! Export coordinator for orchestrating the pipeline
//!
//! The coordinator drives the scroll stream and the export queue and owns
//! the two independent completion conditions: *cursor exhausted* and *queue
//! drained*. The run finishes successfully only when both hold. A drain
//! event alone never terminates the run; between two pages the queue may
//! drain while more pages are still coming.
//!
//! A fatal stream error short-circuits everything: the cursor is released,
//! the queue is abandoned (outstanding writes are not waited for), and the
//! error propagates to the caller.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::queue::ExportQueue;
use crate::export::scroll::DocumentStream;

/// Result of an export run
#[derive(Debug)]
pub struct ExportReport {
    /// Documents written to disk
    pub documents_exported: u64,
    /// Documents whose processing failed
    pub documents_failed: u64,
    /// Documents skipped under the no-clobber collision policy
    pub documents_skipped: u64,
    /// Pages fetched from the index
    pub pages_fetched: u64,
    /// Time taken for the run
    pub elapsed_ms: u64,
    /// Whether the run was interrupted by the user
    pub cancelled: bool,
}

/// Coordinator for export operations
///
/// Wires the document stream, the work queue and the progress tracker
/// together and decides when the process is done.
pub struct ExportCoordinator {
    /// Paginated source of documents
    stream: Box<dyn DocumentStream>,
    /// Bounded-concurrency consumer
    queue: ExportQueue,
    /// Progress feedback, seeded from the index-reported total
    tracker: Arc<ProgressTracker>,
    /// Cancellation token for graceful interrupts
    cancel_token: Option<CancellationToken>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        stream: Box<dyn DocumentStream>,
        queue: ExportQueue,
        tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            stream,
            queue,
            tracker,
            cancel_token: None,
        }
    }

    /// Set cancellation token for this export operation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Execute the export run
    ///
    /// Phases:
    /// 1. Running: fetch pages strictly sequentially and enqueue each one
    ///    whole; the next advance is never issued before the previous page
    ///    has been fully enqueued
    /// 2. Draining: the cursor is exhausted (or the run was interrupted);
    ///    wait for the queue's drain condition
    /// 3. Done: both conditions hold; report the outcome counters
    ///
    /// # Returns
    /// * `Result<ExportReport>` - Run statistics, or the fatal stream error
    pub async fn execute(&mut self) -> Result<ExportReport> {
        let start_time = Instant::now();

        info!("Starting export");
        let mut pages_fetched = 0u64;
        let mut cancelled = false;

        // Phase 1: Running, while the cursor may still have pages.
        loop {
            if let Some(ref token) = self.cancel_token {
                if token.is_cancelled() {
                    info!("Export interrupted, finishing in-flight work");
                    cancelled = true;
                    break;
                }
            }

            match self.stream.next_page().await {
                Ok(Some(page)) => {
                    if pages_fetched == 0 {
                        if let Some(total) = page.total {
                            self.tracker.set_total(total);
                        }
                    }
                    pages_fetched += 1;
                    debug!("enqueueing page #{} ({} documents)", pages_fetched, page.documents.len());
                    self.queue.enqueue_batch(page);
                }
                Ok(None) => {
                    debug!("cursor exhausted after {} pages", pages_fetched);
                    break;
                }
                Err(e) => {
                    // Fatal: release the cursor, abandon outstanding work.
                    let _ = self.stream.close().await;
                    self.queue.abandon();
                    self.tracker.finish();
                    return Err(e);
                }
            }
        }

        // Phase 2: Draining. The cursor is done; the queue may not be.
        let _ = self.stream.close().await;
        self.wait_for_drain().await;

        // Phase 3: Done, cursor exhausted and queue drained.
        self.queue.close().await;
        self.tracker.finish();

        let stats = self.queue.stats();
        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Export completed: {} exported, {} failed, {} skipped, {} pages, {} ms",
            stats.exported, stats.failed, stats.skipped, pages_fetched, elapsed_ms
        );

        Ok(ExportReport {
            documents_exported: stats.exported,
            documents_failed: stats.failed,
            documents_skipped: stats.skipped,
            pages_fetched,
            elapsed_ms,
            cancelled,
        })
    }

    /// Wait until the queue holds no pending and no in-flight work
    ///
    /// Drain events are re-checked against the live drain condition: an
    /// event consumed here may be stale by the time it is observed.
    async fn wait_for_drain(&self) {
        let mut events = self.queue.drain_events();
        loop {
            if self.queue.is_drained() {
                return;
            }
            if events.changed().await.is_err() {
                return;
            }
        }
    }
}
