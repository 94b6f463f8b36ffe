//! Progress-callback trait for target and page events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch runner works through targets and pages. The CLI uses
//! it to drive its progress bar; library users can forward the events
//! anywhere.
//!
//! # Example
//!
//! ```rust
//! use lmp_lite::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}: {markdown_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//! let config = ConversionConfig::builder()
//!     .api_key("sk-test")
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes targets and pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in order; the pipeline never runs two
/// targets or two pages at once.
pub trait ConversionProgressCallback: Send + Sync {
    /// A target is about to be classified.
    fn on_target_start(&self, target: &str) {
        let _ = target;
    }

    /// A URL target is being fetched.
    fn on_web_fetch(&self, url: &str) {
        let _ = url;
    }

    /// An office document is being converted to PDF.
    fn on_office_conversion(&self, path: &Path) {
        let _ = path;
    }

    /// A PDF has been rasterised and its pages are about to be transcribed.
    fn on_document_start(&self, pdf_path: &Path, total_pages: usize) {
        let _ = (pdf_path, total_pages);
    }

    /// Called just before the transcription request for a page is sent.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// A page was transcribed successfully.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }

    /// A page failed and will appear as a placeholder.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// The target's Markdown was written to `output`.
    fn on_target_complete(&self, target: &str, output: &Path) {
        let _ = (target, output);
    }

    /// The target was skipped because of a fatal error.
    fn on_target_error(&self, target: &str, error: &str) {
        let _ = (target, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        targets: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        failed_targets: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_target_start(&self, _target: &str) {
            self.targets.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _markdown_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_target_error(&self, _target: &str, _error: &str) {
            self.failed_targets.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_target_start("a.pdf");
        cb.on_document_start(Path::new("a.pdf"), 2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, 42);
        cb.on_page_error(2, 2, "timeout");
        cb.on_target_complete("a.pdf", Path::new("a.pdf.md"));
        cb.on_target_error("b.txt", "unsupported");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_target_start("a.pdf");
        tracker.on_page_complete(1, 2, 10);
        tracker.on_page_error(2, 2, "HTTP 500");
        tracker.on_target_start("b.txt");
        tracker.on_target_error("b.txt", "unsupported");

        assert_eq!(tracker.targets.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failed_targets.load(Ordering::SeqCst), 1);
    }
}
