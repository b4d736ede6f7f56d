//! Error types for the pdf-page-report library.
//!
//! Four error types map onto the four places a run can go wrong:
//!
//! * [`PageReportError`] — **Fatal**: the run cannot proceed at all
//!   (missing credential, unreadable source PDF). Returned as
//!   `Err(PageReportError)` from the top-level `analyze_document*` functions.
//!
//! * [`AnalysisError`] — one call to the analysis service failed. Only the
//!   transport family ([`AnalysisError::is_transport`]) is retried.
//!
//! * [`WriteError`] — a report file could not be produced from a result.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed after the retry
//!   boundary. Stored inside [`crate::output::PageOutcome`]; the page is left
//!   out of the combined report and the run moves on to the next page.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-page-report library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PageReportError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// A required API key is not set in the environment.
    #[error("Environment variable {var} must be set\nAdd it to your shell or to a .env file.")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client for the analysis service could not be built.
    #[error("Failed to initialise HTTP client: {0}")]
    HttpClient(String),

    // ── Source errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The PDF could not be parsed into pages.
    #[error("Failed to read pages from '{path}': {detail}")]
    SourceRead { path: PathBuf, detail: String },

    /// A single-page file could not be written while splitting.
    #[error("Failed to write page {page} into '{dir}': {detail}")]
    PageWrite {
        page: usize,
        dir: PathBuf,
        detail: String,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single call to the analysis service.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// HTTP 429.
    #[error("Rate limit exceeded, try again later: {detail}")]
    RateLimited { detail: String },

    /// Any other non-success HTTP status (422 included).
    #[error("Analysis request failed with HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The request never produced a response (connect error, timeout,
    /// interrupted body).
    #[error("Analysis request failed: {detail}")]
    Network { detail: String },

    /// A 2xx response whose body is not the JSON document we expect.
    #[error("Analysis service returned an unreadable response: {detail}")]
    InvalidResponse { detail: String },

    /// The page file handed to the client could not be read.
    #[error("Failed to read page file '{path}': {detail}")]
    ReadPage { path: PathBuf, detail: String },
}

impl AnalysisError {
    /// Whether this failure happened at the transport level and may be retried.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AnalysisError::RateLimited { .. }
                | AnalysisError::Http { .. }
                | AnalysisError::Network { .. }
        )
    }

    /// Whether this is the distinct rate-limit condition.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::RateLimited { .. })
    }
}

/// Failure to produce a report file.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The result has no `data.markdown` field. No file is written.
    #[error("Analysis result contains no markdown content")]
    MissingMarkdown,

    #[error("Failed to write report '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal error for a single page.
///
/// The page is excluded from the combined report; the run continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The analysis call failed (after retries, for transport failures).
    #[error("Page {page}: analysis failed after {attempts} attempt(s): {detail}")]
    AnalysisFailed {
        page: usize,
        attempts: u32,
        detail: String,
    },

    /// The service answered with an error payload instead of data.
    #[error("Page {page}: analysis service reported an error: {message}")]
    Rejected { page: usize, message: String },

    /// The result lacked the markdown field.
    #[error("Page {page}: result contains no markdown content")]
    MissingMarkdown { page: usize },

    /// The report file could not be written.
    #[error("Page {page}: failed to save report: {detail}")]
    WriteFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::AnalysisFailed { page, .. }
            | PageError::Rejected { page, .. }
            | PageError::MissingMarkdown { page }
            | PageError::WriteFailed { page, .. } => *page,
        }
    }
}
