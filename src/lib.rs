//! # pdf-page-report
//!
//! Split a PDF into single pages, send each page to the agentic
//! document-analysis API, and assemble the returned Markdown into per-page
//! reports plus one combined report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate the local file
//!  ├─ 2. Split    one temporary single-page PDF per page (lopdf)
//!  ├─ 3. Analyze  multipart upload per page, fixed-delay retry
//!  ├─ 4. Report   pdf_analysis_<ts>_page_<n>.md per successful page
//!  ├─ 5. Combine  pdf_analysis_<ts>_combined.md
//!  └─ 6. Cleanup  page files deleted whatever the outcome
//! ```
//!
//! Pages are processed strictly one after another. A page that fails is
//! logged and skipped; only configuration and source errors are fatal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_page_report::{analyze_document, Credentials, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // LANDING_AI_API_KEY, ANTHROPIC_API_KEY and OPENAI_API_KEY must be set
//!     let credentials = Credentials::from_env()?;
//!     let config = PipelineConfig::builder().output_dir("reports").build()?;
//!     let output = analyze_document("document.pdf", &credentials, &config).await?;
//!     if let Some(path) = output.combined_path {
//!         println!("combined report: {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-report` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Credentials, PipelineConfig, PipelineConfigBuilder, RetryPolicy, DEFAULT_API_URL};
pub use error::{AnalysisError, PageError, PageReportError, WriteError};
pub use output::{PageOutcome, PageSummary, RunOutput, RunStats};
pub use pipeline::analyze::{AnalysisClient, AnalysisResult, Chunk, DocumentAnalyzer};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{analyze_document, analyze_document_sync, analyze_document_with};
