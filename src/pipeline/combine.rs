//! Combine per-page reports into one document.
//!
//! Sections are labelled `Page 1`, `Page 2`, … by their position in the input
//! list, so when pages were skipped the labels are not source page numbers.
//! Every report after the first has its header (the text up to and including
//! the first `---` line) stripped. The first report keeps its header.

use crate::error::WriteError;
use crate::pipeline::report::{FILE_TIMESTAMP, HEADER_TIMESTAMP, REPORT_PREFIX, SEPARATOR};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Combine `report_paths` (in order) into a new file under `output_dir`.
///
/// `total_pages` is printed in the header as-is; the orchestrator passes
/// the number of reports being combined.
pub fn combine_reports(
    report_paths: &[PathBuf],
    total_pages: usize,
    output_dir: &Path,
) -> Result<PathBuf, WriteError> {
    combine_reports_at(report_paths, total_pages, output_dir, Local::now())
}

/// [`combine_reports`] with an explicit timestamp.
pub fn combine_reports_at(
    report_paths: &[PathBuf],
    total_pages: usize,
    output_dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, WriteError> {
    let mut combined = format!(
        "# PDF Analysis Result (Combined)\nProcessed: {}\nTotal pages: {}\n\n{}\n",
        now.format(HEADER_TIMESTAMP),
        total_pages,
        SEPARATOR
    );

    for (i, path) in report_paths.iter().enumerate() {
        let content = std::fs::read_to_string(path).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;
        let body = if i == 0 {
            content.as_str()
        } else {
            strip_header(&content)
        };
        debug!("Combining {} as page {}", path.display(), i + 1);
        combined.push_str(&format!("\n## Page {}\n\n{}\n", i + 1, body));
    }

    std::fs::create_dir_all(output_dir).map_err(|source| WriteError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let output = output_dir.join(format!(
        "{REPORT_PREFIX}{}_combined.md",
        now.format(FILE_TIMESTAMP)
    ));
    std::fs::write(&output, combined).map_err(|source| WriteError::Io {
        path: output.clone(),
        source,
    })?;

    info!(
        "Combined {} reports into {}",
        report_paths.len(),
        output.display()
    );
    Ok(output)
}

/// Text after the first separator line, or all of it when there is none.
fn strip_header(content: &str) -> &str {
    content
        .split_once(SEPARATOR)
        .map(|(_, rest)| rest)
        .unwrap_or(content)
}
