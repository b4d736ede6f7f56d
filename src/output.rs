//! Result types returned by a run.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What came out of a page whose report was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// The per-page report file.
    pub report_path: PathBuf,
    /// Number of chunks the service identified on the page.
    pub chunk_count: usize,
    /// Distinct chunk types, sorted.
    pub chunk_types: Vec<String>,
}

/// Outcome of one page, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Analysis attempts made for this page.
    pub attempts: u32,
    /// Wall-clock time spent on the page, retries included.
    pub duration_ms: u64,
    /// Set when a report was written.
    pub summary: Option<PageSummary>,
    /// Set when the page was skipped.
    pub error: Option<PageError>,
}

impl PageOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.summary.is_some()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages in the source document.
    pub total_pages: usize,
    pub succeeded_pages: usize,
    pub failed_pages: usize,
    /// Analysis calls issued across all pages.
    pub total_attempts: u32,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// One entry per source page, in page order.
    pub pages: Vec<PageOutcome>,
    /// Per-page reports, in page order.
    pub report_paths: Vec<PathBuf>,
    /// The combined report. `None` when no page succeeded or combination failed.
    pub combined_path: Option<PathBuf>,
    /// Why combination failed, if it did.
    pub combine_error: Option<String>,
    pub stats: RunStats,
}

impl RunOutput {
    /// Errors of the pages that were skipped.
    pub fn page_errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}
