//! Run orchestration: split → (analyse → report) per page → combine.
//!
//! Pages are processed one at a time, in order. A page that fails at any
//! step is reported, recorded as a [`PageError`], and left out of the
//! combined report. Its page file is deleted either way. Only a bad source
//! document (or bad configuration) aborts the run.

use crate::config::{Credentials, PipelineConfig};
use crate::error::{PageError, PageReportError, WriteError};
use crate::output::{PageOutcome, PageSummary, RunOutput, RunStats};
use crate::pipeline::analyze::{AnalysisClient, DocumentAnalyzer};
use crate::pipeline::split::{PageFile, SplitFailure};
use crate::pipeline::{combine, input, report, retry, split};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Analyse a PDF page by page against the analysis service.
///
/// This is the primary entry point for the library. The HTTP client is
/// built from `credentials` and `config`.
///
/// # Returns
/// `Ok(RunOutput)` whenever the source could be split, even if every page
/// failed (then `combined_path` is `None`).
///
/// # Errors
/// Returns `Err(PageReportError)` only for fatal errors:
/// - HTTP client cannot be constructed
/// - File not found / permission denied / not a PDF
/// - The PDF cannot be split into pages
pub async fn analyze_document(
    input: impl AsRef<Path>,
    credentials: &Credentials,
    config: &PipelineConfig,
) -> Result<RunOutput, PageReportError> {
    let client = AnalysisClient::new(credentials.landing_ai_api_key.clone(), config)?;
    analyze_document_with(input, config, Arc::new(client)).await
}

/// Synchronous wrapper around [`analyze_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_document_sync(
    input: impl AsRef<Path>,
    credentials: &Credentials,
    config: &PipelineConfig,
) -> Result<RunOutput, PageReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PageReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_document(input, credentials, config))
}

/// [`analyze_document`] against any [`DocumentAnalyzer`].
pub async fn analyze_document_with(
    input: impl AsRef<Path>,
    config: &PipelineConfig,
    analyzer: Arc<dyn DocumentAnalyzer>,
) -> Result<RunOutput, PageReportError> {
    let run_start = Instant::now();
    let input = input.as_ref();
    info!("Starting analysis: {}", input.display());

    // ── Step 1: Validate source ──────────────────────────────────────────
    let source = input::validate_source(input)?;

    // ── Step 2: Split into page files ────────────────────────────────────
    let page_files = split::split_pages(&source, &config.scratch_dir())
        .await
        .map_err(SplitFailure::discard)?;
    let total_pages = page_files.len();
    info!("PDF split into {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_pages);
    }

    // ── Step 3: Analyse and report, page by page ─────────────────────────
    let mut pages = Vec::with_capacity(total_pages);
    let mut report_paths = Vec::new();

    for page_file in page_files {
        let outcome = process_page(analyzer.as_ref(), &page_file, total_pages, config).await;

        if let Err(e) = page_file.delete() {
            warn!("Page {}: failed to delete page file: {}", outcome.page_num, e);
        }

        if let Some(ref summary) = outcome.summary {
            report_paths.push(summary.report_path.clone());
        }
        pages.push(outcome);
    }

    // ── Step 4: Combine ──────────────────────────────────────────────────
    let (combined_path, combine_error) = if report_paths.is_empty() {
        warn!("No page produced a report; nothing to combine");
        (None, None)
    } else {
        match combine::combine_reports(&report_paths, report_paths.len(), &config.output_dir) {
            Ok(path) => (Some(path), None),
            Err(e) => {
                warn!("Failed to combine reports: {}", e);
                (None, Some(e.to_string()))
            }
        }
    };

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let succeeded = pages.iter().filter(|p| p.is_success()).count();
    let stats = RunStats {
        total_pages,
        succeeded_pages: succeeded,
        failed_pages: total_pages - succeeded,
        total_attempts: pages.iter().map(|p| p.attempts).sum(),
        total_duration_ms: run_start.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete: {}/{} pages, {}ms total",
        succeeded, total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_pages, succeeded, combined_path.as_deref());
    }

    Ok(RunOutput {
        pages,
        report_paths,
        combined_path,
        combine_error,
        stats,
    })
}

/// Analyse one page file and write its report.
///
/// Always returns a `PageOutcome`; failures are recorded in it rather than
/// propagated, so one bad page never aborts the document.
async fn process_page(
    analyzer: &dyn DocumentAnalyzer,
    page_file: &PageFile,
    total_pages: usize,
    config: &PipelineConfig,
) -> PageOutcome {
    let start = Instant::now();
    let page_num = page_file.page_num();
    let policy = config.retry_policy();
    let cb = config.progress_callback.as_ref();

    if let Some(cb) = cb {
        cb.on_page_start(page_num, total_pages);
    }
    debug!("Page {}: analysing {}", page_num, page_file.path().display());

    let (analysis, attempts) =
        retry::analyze_with_retry(analyzer, page_file.path(), &policy, |attempt, e| {
            if let Some(cb) = cb {
                cb.on_retry(
                    page_num,
                    attempt,
                    policy.max_retries,
                    policy.delay,
                    e.to_string(),
                );
            }
        })
        .await;

    let result = analysis
        .map_err(|e| PageError::AnalysisFailed {
            page: page_num,
            attempts,
            detail: e.to_string(),
        })
        .and_then(|result| match result.error_message() {
            Some(message) => Err(PageError::Rejected {
                page: page_num,
                message,
            }),
            None => Ok(result),
        })
        .and_then(|result| {
            let report_path = report::write_report(&result, Some(page_num), &config.output_dir)
                .map_err(|e| match e {
                    WriteError::MissingMarkdown => PageError::MissingMarkdown { page: page_num },
                    WriteError::Io { .. } => PageError::WriteFailed {
                        page: page_num,
                        detail: e.to_string(),
                    },
                })?;
            Ok(PageSummary {
                page_num,
                report_path,
                chunk_count: result.chunks().len(),
                chunk_types: result.chunk_types(),
            })
        });

    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(summary) => {
            info!(
                "Page {}: report saved to {} ({} chunks)",
                page_num,
                summary.report_path.display(),
                summary.chunk_count
            );
            if let Some(cb) = cb {
                cb.on_page_complete(page_num, total_pages, &summary);
            }
            PageOutcome {
                page_num,
                attempts,
                duration_ms,
                summary: Some(summary),
                error: None,
            }
        }
        Err(e) => {
            warn!("{}", e);
            if let Some(cb) = cb {
                cb.on_page_error(page_num, total_pages, e.to_string());
            }
            PageOutcome {
                page_num,
                attempts,
                duration_ms,
                summary: None,
                error: Some(e),
            }
        }
    }
}
