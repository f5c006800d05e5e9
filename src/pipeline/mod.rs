//! Traffic-inspection pipeline: admission gate, bounded ingestion queue, and
//! the single worker that drains it.
//!
//! The interception hook runs on the proxy's critical path, so hand-off into
//! the pipeline is strictly non-blocking: [`Inspector::submit`] drops the job
//! and emits one warning when the queue is full, and never makes the caller
//! wait. Exactly one worker task consumes jobs in FIFO order, runs the
//! pattern engine over each body, applies the suppression rule, and forwards
//! surviving matches to the [`ReportSink`].

pub mod admission;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::scan::{Match, RegexEngine};

pub use admission::AdmissionFilter;

/// Default ingestion queue capacity.
pub const QUEUE_CAPACITY: usize = 100_000;

/// Matches whose primary value contains this text are known false positives
/// (the common `Referrer-Policy: same-origin` header) and are not reported.
const SUPPRESSED_VALUE: &str = "same-origin";

/// One admitted response awaiting inspection. Immutable after enqueue and
/// dropped once the worker has processed it.
#[derive(Debug, Clone)]
pub struct InspectionJob {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub body: Arc<[u8]>,
}

/// Destination for formatted match reports and queue-drop warnings.
pub trait ReportSink: Send + Sync {
    /// Receive one formatted line for a surviving match.
    fn report(&self, line: &str);
    /// Called exactly once per job dropped because the queue was full.
    fn queue_full(&self);
}

/// Default sink: forwards to the `tracing` subscriber.
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&self, line: &str) {
        info!("{line}");
    }

    fn queue_full(&self) {
        warn!("Response queue is full, skipping inspection");
    }
}

/// Owns the ingestion queue and the background inspection worker.
pub struct Inspector {
    tx: mpsc::Sender<InspectionJob>,
    filter: AdmissionFilter,
    sink: Arc<dyn ReportSink>,
    worker: JoinHandle<()>,
}

impl Inspector {
    /// Build an inspector with the default queue capacity and admission
    /// filter, and spawn its worker task.
    pub fn new(engine: Arc<RegexEngine>, sink: Arc<dyn ReportSink>) -> Self {
        Self::with_capacity(engine, sink, QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        engine: Arc<RegexEngine>,
        sink: Arc<dyn ReportSink>,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_worker(rx, engine, Arc::clone(&sink)));
        Self {
            tx,
            filter: AdmissionFilter::default(),
            sink,
            worker,
        }
    }

    /// Replace the default admission filter.
    pub fn with_filter(mut self, filter: AdmissionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run the admission filter against the response metadata and enqueue the
    /// job if it passes. Cheap short-circuit for the interception hook.
    pub fn inspect(&self, host: &str, content_type: &str, job: InspectionJob) {
        if !self.filter.admits(host, content_type, job.status_code) {
            return;
        }
        self.submit(job);
    }

    /// Non-blocking enqueue. A full queue drops the job with one warning;
    /// the caller never blocks and never sees an error.
    pub fn submit(&self, job: InspectionJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => self.sink.queue_full(),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Inspection worker has stopped; job discarded");
            }
        }
    }

    /// Close the queue and wait for the worker to finish draining it.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }

    /// Inspector whose worker never drains, so the queue can only fill.
    #[cfg(test)]
    fn suspended(sink: Arc<dyn ReportSink>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(async move {
            let _rx = rx;
            std::future::pending::<()>().await;
        });
        Self {
            tx,
            filter: AdmissionFilter::default(),
            sink,
            worker,
        }
    }
}

/// Drain the queue one job at a time: jobs never overlap, so report lines for
/// job k always precede those for job k+1.
async fn run_worker(
    mut rx: mpsc::Receiver<InspectionJob>,
    engine: Arc<RegexEngine>,
    sink: Arc<dyn ReportSink>,
) {
    while let Some(job) = rx.recv().await {
        let matches = engine.match_all(Arc::clone(&job.body)).await;
        for m in &matches {
            report_match(&job, m, sink.as_ref());
        }
    }
}

fn report_match(job: &InspectionJob, m: &Match, sink: &dyn ReportSink) {
    let Some(primary) = m.group_values.first() else {
        return;
    };
    if primary.contains(SUPPRESSED_VALUE) {
        return;
    }
    sink.report(&format!("[res] {} {} -> {}", job.method, job.url, primary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectSink {
        lines: Mutex<Vec<String>>,
        dropped: AtomicUsize,
    }

    impl CollectSink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl ReportSink for CollectSink {
        fn report(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }

        fn queue_full(&self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn job(method: &str, url: &str, body: &[u8]) -> InspectionJob {
        InspectionJob {
            method: method.to_string(),
            url: url.to_string(),
            status_code: 200,
            body: Arc::from(body),
        }
    }

    async fn engine_with(patterns: &[&str]) -> Arc<RegexEngine> {
        let engine = Arc::new(RegexEngine::new());
        for p in patterns {
            engine.add_pattern(p).await.unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn bearer_token_is_reported() {
        let engine = engine_with(&[r"Bearer\s+[\w-]+"]).await;
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::with_capacity(engine, sink.clone(), 16);

        inspector.submit(job(
            "GET",
            "https://api.example.com/session",
            b"Authorization: Bearer sk-12345",
        ));
        inspector.shutdown().await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "[res] GET https://api.example.com/session -> Bearer sk-12345"
        );
    }

    #[tokio::test]
    async fn same_origin_matches_are_suppressed() {
        let engine = engine_with(&[r#""Referrer-Policy":"([a-z-]+)""#]).await;
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::with_capacity(engine, sink.clone(), 16);

        inspector.submit(job(
            "GET",
            "https://example.com/",
            br#"{"Referrer-Policy":"same-origin"}"#,
        ));
        inspector.shutdown().await;

        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn report_lines_follow_job_submission_order() {
        let engine = engine_with(&[r"token-\d+"]).await;
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::with_capacity(engine, sink.clone(), 64);

        for i in 0..10 {
            let body = format!("payload token-{i} end");
            inspector.submit(job("GET", &format!("https://h/{i}"), body.as_bytes()));
        }
        inspector.shutdown().await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 10);
        for (i, line) in lines.iter().enumerate() {
            assert!(
                line.ends_with(&format!("token-{i}")),
                "out of order at {i}: {line}"
            );
        }
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::suspended(sink.clone(), 2);

        for i in 0..5 {
            inspector.submit(job("GET", &format!("https://h/{i}"), b"body"));
        }

        // two enqueued, three dropped, one warning each
        assert_eq!(sink.dropped.load(Ordering::SeqCst), 3);
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn admission_filter_gates_inspect() {
        let engine = engine_with(&[r"token-\d+"]).await;
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::with_capacity(engine, sink.clone(), 16);

        // denylisted host
        inspector.inspect(
            "fonts.gstatic.com:443",
            "text/html",
            job("GET", "https://fonts.gstatic.com/a", b"token-1"),
        );
        // skippable content type
        inspector.inspect(
            "example.com",
            "image/png",
            job("GET", "https://example.com/b", b"token-2"),
        );
        // non-200 status
        let mut not_found = job("GET", "https://example.com/c", b"token-3");
        not_found.status_code = 404;
        inspector.inspect("example.com", "text/html", not_found);
        // admitted
        inspector.inspect(
            "example.com",
            "text/html",
            job("GET", "https://example.com/d", b"token-4"),
        );
        inspector.shutdown().await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("token-4"));
    }

    #[tokio::test]
    async fn multiple_matches_in_one_job_all_report() {
        let engine = engine_with(&[r"key-[a-z]+"]).await;
        let sink = Arc::new(CollectSink::default());
        let inspector = Inspector::with_capacity(engine, sink.clone(), 16);

        inspector.submit(job("POST", "https://h/", b"key-alpha key-beta key-alpha"));
        inspector.shutdown().await;

        // distinct values report once each; the repeated key-alpha collapses
        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
    }
}
