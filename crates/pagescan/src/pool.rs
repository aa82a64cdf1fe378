//! Bounded OCR worker pool.
//!
//! `N` worker tasks pull [`PageTask`]s from one unbounded channel. The channel
//! preserves submission order and only `N` workers exist, so at most `N` pages
//! are recognized at once and the rest wait in FIFO order. Each submission gets
//! its own oneshot reply, which keeps result collection independent of the
//! order pages finish in.
//!
//! A recognition failure becomes a `RecognitionFailed` [`PageResult`]; it never
//! reaches sibling pages. There is no retry. Dropping the pool aborts every
//! worker, and with it any engine process still running.

use crate::ocr::{OcrEngine, RecognizeOptions};
use crate::types::{PageResult, PageTask};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinSet;

struct QueuedPage {
    task: PageTask,
    result_tx: oneshot::Sender<PageResult>,
}

/// Shared receiver for multiple workers pulling from one unbounded channel.
struct SharedReceiver<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> SharedReceiver<T> {
    fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self { rx: self.rx.clone() }
    }
}

/// Live counters for a pool. Cheap to read from tests and logs.
#[derive(Debug, Default)]
pub struct PoolStats {
    pending: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    completed: AtomicUsize,
}

impl PoolStats {
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of pages ever recognized at the same time.
    pub fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn start(&self) -> RunningGuard<'_> {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now, Ordering::SeqCst);
        RunningGuard { stats: self }
    }
}

struct RunningGuard<'a> {
    stats: &'a PoolStats,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.stats.running.fetch_sub(1, Ordering::SeqCst);
        self.stats.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle to a submitted page.
#[derive(Debug)]
pub struct PendingPage {
    page_number: usize,
    rx: oneshot::Receiver<PageResult>,
}

impl PendingPage {
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Wait for the page to finish.
    ///
    /// Always yields a result for this page; a worker that disappeared without
    /// answering counts as a recognition failure.
    pub async fn wait(self) -> PageResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => PageResult::recognition_failed(
                self.page_number,
                "recognition worker stopped before finishing the page",
            ),
        }
    }
}

pub struct OcrWorkerPool {
    sender: Option<mpsc::UnboundedSender<QueuedPage>>,
    workers: JoinSet<()>,
    stats: Arc<PoolStats>,
    concurrency: usize,
}

impl OcrWorkerPool {
    /// Spawn `concurrency` workers sharing `engine`. A limit of zero is raised
    /// to one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(engine: Arc<dyn OcrEngine>, options: RecognizeOptions, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = SharedReceiver::new(receiver);
        let stats = Arc::new(PoolStats::default());
        let options = Arc::new(options);
        let mut workers = JoinSet::new();

        for worker in 0..concurrency {
            let rx = receiver.clone();
            let engine = Arc::clone(&engine);
            let options = Arc::clone(&options);
            let stats = Arc::clone(&stats);

            workers.spawn(async move {
                tracing::trace!(worker, "OCR worker started");

                while let Some(QueuedPage { task, result_tx }) = rx.recv().await {
                    let page = task.page_number;
                    let result = {
                        let _running = stats.start();
                        tracing::debug!(worker, page, "Recognizing page");
                        match engine.recognize(&task.image_path, &options).await {
                            Ok(text) => PageResult::ok(page, text),
                            Err(e) => {
                                tracing::warn!(worker, page, error = %e, "Page recognition failed");
                                PageResult::recognition_failed(page, e.to_string())
                            }
                        }
                    };

                    // The submitter may have stopped listening; the page is simply dropped.
                    let _ = result_tx.send(result);
                }

                tracing::trace!(worker, "OCR worker stopped");
            });
        }

        Self {
            sender: Some(sender),
            workers,
            stats,
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Queue a page whose image already exists.
    pub fn submit(&self, task: PageTask) -> PendingPage {
        let page_number = task.page_number;
        let (result_tx, rx) = oneshot::channel();
        let queued = QueuedPage { task, result_tx };

        match &self.sender {
            Some(sender) => {
                self.stats.pending.fetch_add(1, Ordering::SeqCst);
                if let Err(mpsc::error::SendError(queued)) = sender.send(queued) {
                    self.stats.pending.fetch_sub(1, Ordering::SeqCst);
                    let _ = queued
                        .result_tx
                        .send(PageResult::recognition_failed(page_number, "worker pool is shut down"));
                }
            }
            None => {
                let _ = queued
                    .result_tx
                    .send(PageResult::recognition_failed(page_number, "worker pool is shut down"));
            }
        }

        PendingPage { page_number, rx }
    }

    /// Stop accepting pages, let queued pages finish, and wait for every worker.
    pub async fn shutdown(mut self) {
        self.sender.take();
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined
                && e.is_panic()
            {
                tracing::error!(error = %e, "OCR worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Returns the image file name after `delay`; fails for `page-<fail>.png`.
    struct EchoEngine {
        delay: Duration,
        fail: Option<usize>,
    }

    #[async_trait]
    impl OcrEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn recognize(&self, image_path: &Path, _options: &RecognizeOptions) -> Result<String, OcrError> {
            tokio::time::sleep(self.delay).await;
            let name = image_path.file_name().unwrap().to_string_lossy().to_string();
            if let Some(fail) = self.fail
                && name == format!("page-{}.png", fail)
            {
                return Err(OcrError::ProcessingFailed("engine crashed".to_string()));
            }
            Ok(name)
        }
    }

    fn task(page_number: usize) -> PageTask {
        PageTask {
            page_number,
            document_path: Arc::new(PathBuf::from("source.pdf")),
            image_path: PathBuf::from(format!("page-{}.png", page_number)),
            page_size: None,
        }
    }

    /// Logs the order in which pages reach the engine.
    #[derive(Default)]
    struct RecordingEngine {
        order: parking_lot::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl OcrEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        async fn recognize(&self, image_path: &Path, _options: &RecognizeOptions) -> Result<String, OcrError> {
            let page = image_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix("page-"))
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            self.order.lock().push(page);
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(page.to_string())
        }
    }

    fn pool(delay_ms: u64, fail: Option<usize>, concurrency: usize) -> OcrWorkerPool {
        let engine = Arc::new(EchoEngine {
            delay: Duration::from_millis(delay_ms),
            fail,
        });
        OcrWorkerPool::new(engine, RecognizeOptions::default(), concurrency)
    }

    #[tokio::test]
    async fn test_submit_returns_page_text() {
        let pool = pool(0, None, 2);
        let result = pool.submit(task(1)).wait().await;
        assert_eq!(result, PageResult::ok(1, "page-1.png"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let pool = pool(5, Some(2), 2);
        let pending: Vec<_> = (1..=3).map(|n| pool.submit(task(n))).collect();

        let mut results = Vec::new();
        for p in pending {
            results.push(p.wait().await);
        }

        assert!(results[0].is_ok());
        assert_eq!(results[1], PageResult::recognition_failed(2, "OCR processing failed: engine crashed"));
        assert!(results[2].is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_running_never_exceeds_limit() {
        let pool = pool(20, None, 2);
        let stats = pool.stats();
        let pending: Vec<_> = (1..=8).map(|n| pool.submit(task(n))).collect();

        for p in pending {
            assert!(p.wait().await.is_ok());
        }

        assert!(stats.peak_running() <= 2);
        assert!(stats.peak_running() >= 1);
        assert_eq!(stats.completed(), 8);
        assert_eq!(stats.running(), 0);
        assert_eq!(stats.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_queued_pages_are_admitted_in_submission_order() {
        let engine = Arc::new(RecordingEngine::default());
        let pool = OcrWorkerPool::new(engine.clone(), RecognizeOptions::default(), 1);
        let submitted = [5, 1, 4, 2, 3];
        let pending: Vec<_> = submitted.iter().map(|n| pool.submit(task(*n))).collect();

        for p in pending {
            assert!(p.wait().await.is_ok());
        }

        assert_eq!(*engine.order.lock(), submitted);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_raised_to_one() {
        let pool = pool(0, None, 0);
        assert_eq!(pool.concurrency(), 1);
        assert!(pool.submit(task(1)).wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_pages() {
        let pool = pool(5, None, 1);
        let stats = pool.stats();
        let pending: Vec<_> = (1..=3).map(|n| pool.submit(task(n))).collect();

        pool.shutdown().await;

        assert_eq!(stats.completed(), 3);
        for p in pending {
            assert!(p.wait().await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_dropped_pool_reports_recognition_failure() {
        let pool = pool(10_000, None, 1);
        let pending = pool.submit(task(4));
        drop(pool);

        let result = pending.wait().await;
        assert_eq!(result.page_number, 4);
        assert_eq!(result.status(), crate::types::PageStatus::RecognitionFailed);
    }
}
