//! Progress-callback trait for per-page run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through each page. The callback lives as
//! long as the config it is stored in, so its lifetime is the run and not
//! the process.
//!
//! # Example
//!
//! ```rust
//! use pdf_page_report::{PageSummary, PipelineConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, summary: &PageSummary) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} chunks", page_num, total_pages, summary.chunk_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PageSummary;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Called by the pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after the source has been split.
    ///
    /// # Arguments
    /// * `total_pages` — number of page files that will be analysed
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the first analysis attempt for a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a transport failure is about to be retried.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt that just failed
    /// * `max_attempts` — total attempts allowed
    /// * `delay`        — pause before the next attempt
    /// * `error`        — human-readable failure description
    fn on_retry(
        &self,
        page_num: usize,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: String,
    ) {
        let _ = (page_num, attempt, max_attempts, delay, error);
    }

    /// Called when a page report has been written.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, summary: &PageSummary) {
        let _ = (page_num, total_pages, summary);
    }

    /// Called when a page is given up on.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — pages in the source document
    /// * `success_count` — pages with a written report
    /// * `combined`      — the combined report, if one was produced
    fn on_run_complete(&self, total_pages: usize, success_count: usize, combined: Option<&Path>) {
        let _ = (total_pages, success_count, combined);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
