use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct UsageMetrics {
    documents_summarized: AtomicU64,
    pdfs_rendered: AtomicU64,
}

impl UsageMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that was extracted and summarized successfully.
    pub fn record_summary(&self) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a markdown summary that was rendered to a PDF artifact.
    pub fn record_render(&self) {
        self.pdfs_rendered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            pdfs_rendered: self.pdfs_rendered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Number of PDF artifacts rendered since startup.
    pub pdfs_rendered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_summaries_and_renders() {
        let metrics = UsageMetrics::new();
        metrics.record_summary();
        metrics.record_summary();
        metrics.record_render();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.pdfs_rendered, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = UsageMetrics::new();
        assert_eq!(metrics.snapshot().documents_summarized, 0);
        assert_eq!(metrics.snapshot().pdfs_rendered, 0);
    }
}
