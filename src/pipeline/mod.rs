//! Pipeline stages for a page-by-page analysis run.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and [`crate::run`] only sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ split ──▶ analyze (retry) ──▶ report ──▶ combine
//! (%PDF)   (lopdf)   (HTTP, per page)    (per page)  (all pages)
//! ```
//!
//! 1. [`input`]   — check the source path is a readable PDF
//! 2. [`split`]   — write one single-page PDF per source page
//! 3. [`analyze`] — upload a page to the analysis service; the only stage
//!    with network I/O
//! 4. [`retry`]   — fixed-delay retry of transport failures around `analyze`
//! 5. [`report`]  — header + markdown report file per page
//! 6. [`combine`] — concatenate page reports into the combined report

pub mod analyze;
pub mod combine;
pub mod input;
pub mod report;
pub mod retry;
pub mod split;
