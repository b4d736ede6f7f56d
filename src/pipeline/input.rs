//! Input validation: make sure the source path is a readable PDF.
//!
//! Checking the `%PDF` magic bytes up front turns "wrong file" into a clear
//! [`PageReportError::NotAPdf`] instead of an opaque parser error later.

use crate::error::PageReportError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local source path and return it as an owned path.
pub fn validate_source(path: &Path) -> Result<PathBuf, PageReportError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(PageReportError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(PageReportError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PageReportError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(PageReportError::FileNotFound { path });
        }
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(path)
}
