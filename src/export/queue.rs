//! Bounded-concurrency work queue for document export
//!
//! The queue accepts whole pages of documents and fans them out to a fixed
//! number of worker tasks. Each worker pulls one document at a time, runs
//! the processor, and records exactly one terminal outcome per document;
//! a processor failure is captured at the queue boundary and never aborts
//! sibling work.
//!
//! Drain signalling: every time `in_flight` drops to zero with nothing
//! pending, the queue bumps a watch-channel generation counter. That can
//! happen many times over the queue's life (a page may fully drain before
//! the next page arrives), so consumers must combine the event with a live
//! [`ExportQueue::is_drained`] check and their own end-of-input condition
//! before treating it as final.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{Document, Page};
use crate::sink::WriteOutcome;

/// Processing step applied to each dequeued document
///
/// The production implementation is `DocumentExporter`; tests instrument
/// this seam with counting stubs.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Process one document to its terminal outcome
    async fn process(&self, document: Document) -> Result<WriteOutcome>;
}

/// Counters for terminal document outcomes
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueStats {
    /// Documents written to disk
    pub exported: u64,
    /// Documents whose processing failed
    pub failed: u64,
    /// Documents skipped because their output path already existed
    pub skipped: u64,
}

impl QueueStats {
    /// Total number of documents with a recorded terminal outcome
    pub fn processed(&self) -> u64 {
        self.exported + self.failed + self.skipped
    }
}

/// Pending/in-flight counters, guarded together with the drain check.
///
/// On a multi-threaded runtime these two fields and the drain decision must
/// change under one lock; the lock is only ever held across non-await
/// sections.
#[derive(Debug, Default)]
struct QueueState {
    pending: usize,
    in_flight: usize,
}

struct QueueShared {
    state: Mutex<QueueState>,
    drain_tx: watch::Sender<u64>,
    exported: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    tracker: Option<Arc<ProgressTracker>>,
}

impl QueueShared {
    /// Counter lock. A poisoned lock still yields its counters; a panicking
    /// worker must not take drain tracking down with it.
    fn state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move one document from pending to in-flight
    fn begin_task(&self) {
        let mut state = self.state();
        state.pending -= 1;
        state.in_flight += 1;
    }

    /// Retire one in-flight document and emit a drain event if the queue
    /// is now empty
    fn finish_task(&self) {
        let drained = {
            let mut state = self.state();
            state.in_flight -= 1;
            state.in_flight == 0 && state.pending == 0
        };

        if let Some(ref tracker) = self.tracker {
            tracker.update(self.stats().processed());
        }

        if drained {
            debug!("queue drained");
            self.drain_tx.send_modify(|generation| *generation += 1);
        }
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            exported: self.exported.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }

    fn record_outcome(&self, document: &Document, outcome: Result<WriteOutcome>) {
        match outcome {
            Ok(WriteOutcome::Written(path)) => {
                debug!("exported \"{}\" to \"{}\"", document.url, path.display());
                self.exported.fetch_add(1, Ordering::Relaxed);
            }
            Ok(WriteOutcome::SkippedExisting(path)) => {
                info!("skipped \"{}\": \"{}\" already exists", document.url, path.display());
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("failed to export \"{}\": {}", document.url, e);
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// FIFO work queue with a fixed concurrency limit
///
/// Insertion order within a page dictates dequeue order only; completion
/// order across concurrent workers is unspecified.
pub struct ExportQueue {
    shared: Arc<QueueShared>,
    task_tx: Option<mpsc::UnboundedSender<Document>>,
    workers: Vec<JoinHandle<()>>,
}

impl ExportQueue {
    /// Create a queue and spawn its workers
    ///
    /// # Arguments
    /// * `concurrency` - Maximum number of documents processed at once
    /// * `processor` - Processing step applied to each document
    /// * `tracker` - Optional progress tracker updated per outcome
    pub fn new(
        concurrency: usize,
        processor: Arc<dyn DocumentProcessor>,
        tracker: Option<Arc<ProgressTracker>>,
    ) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel::<Document>();
        let (drain_tx, _) = watch::channel(0u64);

        let shared = Arc::new(QueueShared {
            state: Mutex::new(QueueState::default()),
            drain_tx,
            exported: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            tracker,
        });

        let task_rx = Arc::new(tokio::sync::Mutex::new(task_rx));
        let workers = (0..concurrency.max(1))
            .map(|id| {
                let shared = Arc::clone(&shared);
                let processor = Arc::clone(&processor);
                let task_rx = Arc::clone(&task_rx);
                tokio::spawn(worker_loop(id, shared, processor, task_rx))
            })
            .collect();

        Self {
            shared,
            task_tx: Some(task_tx),
            workers,
        }
    }

    /// Append every document in a page as an individual task
    ///
    /// # Arguments
    /// * `page` - Page whose documents are enqueued in order
    pub fn enqueue_batch(&self, page: Page) {
        let Some(ref tx) = self.task_tx else {
            warn!("enqueue after close, dropping {} documents", page.documents.len());
            return;
        };

        {
            let mut state = self.shared.state();
            state.pending += page.documents.len();
        }

        for document in page.documents {
            // Workers outlive the sender, so this cannot fail while the
            // queue is open.
            if tx.send(document).is_err() {
                let mut state = self.shared.state();
                state.pending -= 1;
            }
        }
    }

    /// Whether no task is pending and none is in flight
    pub fn is_drained(&self) -> bool {
        let state = self.shared.state();
        state.pending == 0 && state.in_flight == 0
    }

    /// Subscribe to drain events
    ///
    /// The receiver observes a generation counter that increases on every
    /// drain transition. A drain event is not a termination signal by
    /// itself; callers must also check their end-of-input condition.
    pub fn drain_events(&self) -> watch::Receiver<u64> {
        self.shared.drain_tx.subscribe()
    }

    /// Current outcome counters
    pub fn stats(&self) -> QueueStats {
        self.shared.stats()
    }

    /// Stop intake and wait for the workers to finish all accepted work
    pub async fn close(&mut self) {
        self.task_tx.take();
        join_all(self.workers.drain(..)).await;
    }

    /// Stop intake and abort the workers without waiting (fatal path).
    /// Pending documents are dropped; in-flight writes are not waited for.
    pub fn abandon(&mut self) {
        self.task_tx.take();
        for worker in self.workers.drain(..) {
            worker.abort();
        }
    }
}

impl Drop for ExportQueue {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            debug!("ExportQueue dropped without explicit close");
            self.abandon();
        }
    }
}

/// One worker: pull a document, process it, record the outcome
async fn worker_loop(
    id: usize,
    shared: Arc<QueueShared>,
    processor: Arc<dyn DocumentProcessor>,
    task_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Document>>>,
) {
    loop {
        // Hold the receiver lock only while waiting for the next document,
        // never across processing.
        let document = {
            let mut rx = task_rx.lock().await;
            rx.recv().await
        };

        let Some(document) = document else {
            debug!("worker {id} shutting down");
            break;
        };

        shared.begin_task();
        let outcome = processor.process(document.clone()).await;
        shared.record_outcome(&document, outcome);
        shared.finish_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn doc(url: &str) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            description: String::new(),
            raw_content: String::new(),
        }
    }

    fn page_of(n: usize) -> Page {
        Page {
            documents: (0..n).map(|i| doc(&format!("http://a.com/{i}"))).collect(),
            scroll_id: None,
            total: None,
        }
    }

    /// Counter-instrumented processor tracking the in-flight high-water mark
    struct GaugeProcessor {
        current: AtomicUsize,
        max_seen: AtomicUsize,
        delay: Duration,
    }

    impl GaugeProcessor {
        fn new(delay: Duration) -> Self {
            Self {
                current: AtomicUsize::new(0),
                max_seen: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl DocumentProcessor for GaugeProcessor {
        async fn process(&self, document: Document) -> Result<WriteOutcome> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(WriteOutcome::Written(PathBuf::from(document.url)))
        }
    }

    /// Fails documents whose URL contains "bad"
    struct FlakyProcessor;

    #[async_trait]
    impl DocumentProcessor for FlakyProcessor {
        async fn process(&self, document: Document) -> Result<WriteOutcome> {
            if document.url.contains("bad") {
                Err(SinkError::WriteFile {
                    path: PathBuf::from(&document.url),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
                }
                .into())
            } else {
                Ok(WriteOutcome::Written(PathBuf::from(document.url)))
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let processor = Arc::new(GaugeProcessor::new(Duration::from_millis(10)));
        let mut queue = ExportQueue::new(2, processor.clone(), None);

        queue.enqueue_batch(page_of(10));
        queue.close().await;

        assert!(processor.max_seen.load(Ordering::SeqCst) <= 2);
        assert_eq!(queue.stats().processed(), 10);
        assert!(queue.is_drained());
    }

    #[tokio::test]
    async fn test_every_document_gets_one_terminal_outcome() {
        let mut queue = ExportQueue::new(3, Arc::new(FlakyProcessor), None);

        queue.enqueue_batch(Page {
            documents: vec![
                doc("http://a.com/ok1"),
                doc("http://a.com/bad1"),
                doc("http://a.com/ok2"),
                doc("http://a.com/bad2"),
                doc("http://a.com/ok3"),
            ],
            scroll_id: None,
            total: None,
        });
        queue.close().await;

        let stats = queue.stats();
        assert_eq!(stats.exported, 3);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.processed(), 5);
        assert!(queue.is_drained());
    }

    #[tokio::test]
    async fn test_drain_event_fires_per_empty_transition() {
        let processor = Arc::new(GaugeProcessor::new(Duration::from_millis(1)));
        let mut queue = ExportQueue::new(2, processor, None);
        let mut events = queue.drain_events();

        queue.enqueue_batch(page_of(2));
        events.changed().await.unwrap();
        let first_generation = *events.borrow_and_update();
        assert!(queue.is_drained());

        // A second page drains again: a new event, not a repeat of the old.
        queue.enqueue_batch(page_of(2));
        events.changed().await.unwrap();
        assert!(*events.borrow_and_update() > first_generation);

        queue.close().await;
        assert_eq!(queue.stats().processed(), 4);
    }

    /// Panics on documents whose URL contains "panic"
    struct PanickyProcessor;

    #[async_trait]
    impl DocumentProcessor for PanickyProcessor {
        async fn process(&self, document: Document) -> Result<WriteOutcome> {
            if document.url.contains("panic") {
                panic!("processor blew up");
            }
            Ok(WriteOutcome::Written(PathBuf::from(document.url)))
        }
    }

    #[tokio::test]
    async fn test_worker_panic_does_not_poison_queue_state() {
        let mut queue = ExportQueue::new(2, Arc::new(PanickyProcessor), None);

        queue.enqueue_batch(Page {
            documents: vec![
                doc("http://a.com/ok1"),
                doc("http://a.com/panic"),
                doc("http://a.com/ok2"),
                doc("http://a.com/ok3"),
            ],
            scroll_id: None,
            total: None,
        });
        queue.close().await;

        // The panicked document never retires, so the queue is not drained,
        // but the counters stay readable and siblings still completed.
        assert_eq!(queue.stats().exported, 3);
        assert!(!queue.is_drained());
    }

    #[tokio::test]
    async fn test_new_queue_is_drained() {
        let queue = ExportQueue::new(2, Arc::new(FlakyProcessor), None);
        assert!(queue.is_drained());
        assert_eq!(queue.stats().processed(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_after_close_drops_batch() {
        let mut queue = ExportQueue::new(1, Arc::new(FlakyProcessor), None);
        queue.close().await;

        queue.enqueue_batch(page_of(3));
        assert!(queue.is_drained());
        assert_eq!(queue.stats().processed(), 0);
    }
}
