//! Per-page report files.
//!
//! A report is a short header followed by a `---` separator line and the
//! page markdown exactly as the service returned it:
//!
//! ```text
//! # PDF Analysis Result
//! Processed: 2026-10-14 09:30:00
//! Page: 3
//!
//! ---
//!
//! <markdown>
//! ```

use crate::error::WriteError;
use crate::pipeline::analyze::AnalysisResult;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix shared by every file this crate writes into the output directory.
pub const REPORT_PREFIX: &str = "pdf_analysis_";

/// `strftime` pattern for timestamps embedded in file names.
pub const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// `strftime` pattern for timestamps inside report headers.
pub const HEADER_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Line that ends every report header.
pub const SEPARATOR: &str = "---\n";

/// Write the report for `result` into `output_dir`, stamped with the current time.
pub fn write_report(
    result: &AnalysisResult,
    page_num: Option<usize>,
    output_dir: &Path,
) -> Result<PathBuf, WriteError> {
    write_report_at(result, page_num, output_dir, Local::now())
}

/// [`write_report`] with an explicit timestamp.
///
/// # Errors
/// [`WriteError::MissingMarkdown`] when `result` has no `data.markdown`;
/// nothing is written in that case.
pub fn write_report_at(
    result: &AnalysisResult,
    page_num: Option<usize>,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, WriteError> {
    let markdown = result.markdown().ok_or(WriteError::MissingMarkdown)?;

    let path = output_dir.join(report_file_name(page_num, now));
    let contents = format!("{}{}", report_header(page_num, now), markdown);

    std::fs::create_dir_all(output_dir).map_err(|source| WriteError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    std::fs::write(&path, contents).map_err(|source| WriteError::Io {
        path: path.clone(),
        source,
    })?;

    debug!("Wrote report {}", path.display());
    Ok(path)
}

/// `pdf_analysis_{timestamp}[_page_{n}].md`
pub fn report_file_name(page_num: Option<usize>, now: DateTime<Local>) -> String {
    let suffix = page_num.map(|n| format!("_page_{n}")).unwrap_or_default();
    format!("{REPORT_PREFIX}{}{suffix}.md", now.format(FILE_TIMESTAMP))
}

fn report_header(page_num: Option<usize>, now: DateTime<Local>) -> String {
    let page_line = page_num.map(|n| format!("Page: {n}")).unwrap_or_default();
    format!(
        "# PDF Analysis Result\nProcessed: {}\n{}\n\n{}\n",
        now.format(HEADER_TIMESTAMP),
        page_line,
        SEPARATOR
    )
}
