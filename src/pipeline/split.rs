//! Page splitting: one multi-page PDF in, one single-page PDF per page out.
//!
//! Each output is the source document with every other page deleted and the
//! unreachable objects pruned, so fonts and images shared across pages stay
//! intact on the page that uses them.
//!
//! ## Why spawn_blocking?
//!
//! `lopdf` parses and serialises synchronously and a large document can take
//! a noticeable amount of CPU per page. The work is moved off the Tokio
//! worker threads the same way any other blocking file work would be.

use crate::error::PageReportError;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::fmt;
use tracing::{debug, info, warn};

/// A transient single-page PDF produced by [`split_pages`].
///
/// The caller owns the file. [`PageFile::delete`] consumes the handle, so a
/// page file cannot be deleted twice.
#[derive(Debug)]
pub struct PageFile {
    page_num: usize,
    path: PathBuf,
}

impl PageFile {
    /// 1-indexed position of this page in the source document.
    pub fn page_num(&self) -> usize {
        self.page_num
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file from disk.
    pub fn delete(self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }
}

/// A split that stopped part-way through.
///
/// The page files written before the failure are handed back in `written`;
/// the caller owns them.
#[derive(Debug)]
pub struct SplitFailure {
    pub error: PageReportError,
    pub written: Vec<PageFile>,
}

impl SplitFailure {
    /// Delete every page file in `written` and return the underlying error.
    pub fn discard(self) -> PageReportError {
        for file in self.written {
            let page_num = file.page_num();
            if let Err(e) = file.delete() {
                warn!("Page {}: failed to delete page file: {}", page_num, e);
            }
        }
        self.error
    }
}

impl From<PageReportError> for SplitFailure {
    fn from(error: PageReportError) -> Self {
        Self {
            error,
            written: Vec::new(),
        }
    }
}

impl fmt::Display for SplitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} page files written)", self.error, self.written.len())
    }
}

/// Split `source` into single-page PDFs written under `scratch_dir`.
///
/// # Returns
/// One [`PageFile`] per source page, in page order.
///
/// # Errors
/// [`PageReportError::SourceRead`] if the source cannot be parsed, and
/// [`PageReportError::PageWrite`] if a page file cannot be written. Page
/// files written before the failure are left on disk and returned in
/// [`SplitFailure::written`].
pub async fn split_pages(
    source: &Path,
    scratch_dir: &Path,
) -> Result<Vec<PageFile>, SplitFailure> {
    let source = source.to_path_buf();
    let scratch_dir = scratch_dir.to_path_buf();

    tokio::task::spawn_blocking(move || split_pages_blocking(&source, &scratch_dir))
        .await
        .map_err(|e| PageReportError::Internal(format!("Split task panicked: {}", e)))?
}

/// Blocking implementation of [`split_pages`].
pub fn split_pages_blocking(
    source: &Path,
    scratch_dir: &Path,
) -> Result<Vec<PageFile>, SplitFailure> {
    let document = Document::load(source).map_err(|e| PageReportError::SourceRead {
        path: source.to_path_buf(),
        detail: e.to_string(),
    })?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    info!("PDF loaded: {} pages", page_numbers.len());

    if page_numbers.is_empty() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(scratch_dir).map_err(|e| PageReportError::PageWrite {
        page: 1,
        dir: scratch_dir.to_path_buf(),
        detail: e.to_string(),
    })?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    write_pages(&document, &page_numbers, |page_num, single| {
        save_page(single, page_num, stem, scratch_dir)
    })
}

/// Reduce `document` to each page in turn and hand it to `write`.
fn write_pages<W>(
    document: &Document,
    page_numbers: &[u32],
    mut write: W,
) -> Result<Vec<PageFile>, SplitFailure>
where
    W: FnMut(usize, &mut Document) -> Result<PathBuf, PageReportError>,
{
    let mut page_files = Vec::with_capacity(page_numbers.len());

    for (idx, &number) in page_numbers.iter().enumerate() {
        let page_num = idx + 1;

        let mut single = document.clone();
        let others: Vec<u32> = page_numbers
            .iter()
            .copied()
            .filter(|&p| p != number)
            .collect();
        single.delete_pages(&others);
        single.prune_objects();

        match write(page_num, &mut single) {
            Ok(path) => {
                debug!("Wrote page {} → {}", page_num, path.display());
                page_files.push(PageFile { page_num, path });
            }
            Err(error) => {
                return Err(SplitFailure {
                    error,
                    written: page_files,
                })
            }
        }
    }

    Ok(page_files)
}

/// Save one single-page document as a kept temp file in `scratch_dir`.
fn save_page(
    single: &mut Document,
    page_num: usize,
    stem: &str,
    scratch_dir: &Path,
) -> Result<PathBuf, PageReportError> {
    let write_err = |detail: String| PageReportError::PageWrite {
        page: page_num,
        dir: scratch_dir.to_path_buf(),
        detail,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{stem}_page_{page_num}_"))
        .suffix(".pdf")
        .tempfile_in(scratch_dir)
        .map_err(|e| write_err(e.to_string()))?;

    single
        .save_to(tmp.as_file_mut())
        .map_err(|e| write_err(e.to_string()))?;

    tmp.into_temp_path()
        .keep()
        .map_err(|e| write_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use tempfile::TempDir;

    /// Build an `n`-page PDF whose page `i` draws the text `page-{i}-marker`.
    fn write_fixture(path: &Path, n: usize) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for i in 1..=n {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("page-{i}-marker"))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn page_text(path: &Path) -> (usize, String) {
        let doc = Document::load(path).unwrap();
        let pages = doc.get_pages();
        let text = pages
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect::<Vec<_>>()
            .join("");
        (pages.len(), text)
    }

    #[test]
    fn splits_into_one_file_per_page_in_order() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("three.pdf");
        write_fixture(&source, 3);
        let scratch = dir.path().join("pages");

        let files = split_pages_blocking(&source, &scratch).unwrap();
        assert_eq!(files.len(), 3);

        for (i, file) in files.iter().enumerate() {
            assert_eq!(file.page_num(), i + 1);
            assert!(file.path().starts_with(&scratch));
            let (count, text) = page_text(file.path());
            assert_eq!(count, 1, "each page file holds a single page");
            assert!(text.contains(&format!("page-{}-marker", i + 1)), "got: {text}");
            for other in (1..=3).filter(|&o| o != i + 1) {
                assert!(!text.contains(&format!("page-{other}-marker")));
            }
        }
    }

    #[test]
    fn concatenated_pages_reproduce_source_order() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("five.pdf");
        write_fixture(&source, 5);

        let files = split_pages_blocking(&source, dir.path()).unwrap();
        let joined: String = files.iter().map(|f| page_text(f.path()).1).collect();
        let (_, original) = page_text(&source);

        let markers = |s: &str| -> Vec<usize> {
            (1..=5)
                .filter_map(|i| s.find(&format!("page-{i}-marker")).map(|pos| (pos, i)))
                .collect::<std::collections::BTreeMap<_, _>>()
                .into_values()
                .collect()
        };
        assert_eq!(markers(&joined), markers(&original));
        assert_eq!(markers(&joined), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("one.pdf");
        write_fixture(&source, 1);

        let mut files = split_pages_blocking(&source, dir.path()).unwrap();
        let file = files.remove(0);
        let path = file.path().to_path_buf();
        assert!(path.exists());
        file.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn unparseable_source_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.pdf");
        std::fs::write(&source, b"%PDF-1.4\nthis is not really a pdf\n").unwrap();

        let err = split_pages_blocking(&source, dir.path()).unwrap_err();
        assert!(matches!(err.error, PageReportError::SourceRead { .. }), "got: {err}");
        assert!(err.written.is_empty());
    }

    #[test]
    fn failure_part_way_hands_back_written_pages() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("four.pdf");
        write_fixture(&source, 4);
        let scratch = dir.path().join("pages");
        std::fs::create_dir_all(&scratch).unwrap();

        let document = Document::load(&source).unwrap();
        let numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let failure = write_pages(&document, &numbers, |page_num, single| {
            if page_num == 3 {
                return Err(PageReportError::PageWrite {
                    page: 3,
                    dir: scratch.clone(),
                    detail: "disk full".into(),
                });
            }
            save_page(single, page_num, "four", &scratch)
        })
        .unwrap_err();

        assert!(matches!(failure.error, PageReportError::PageWrite { page: 3, .. }));
        let written: Vec<_> = failure.written.iter().map(|f| f.page_num()).collect();
        assert_eq!(written, vec![1, 2]);
        assert!(failure.written.iter().all(|f| f.path().exists()));

        let paths: Vec<PathBuf> = failure.written.iter().map(|f| f.path().to_path_buf()).collect();
        let error = failure.discard();
        assert!(matches!(error, PageReportError::PageWrite { .. }));
        assert!(paths.iter().all(|p| !p.exists()));
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn async_split_matches_blocking() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("two.pdf");
        write_fixture(&source, 2);

        let files = split_pages(&source, dir.path()).await.unwrap();
        assert_eq!(files.len(), 2);
        for f in files {
            f.delete().unwrap();
        }
    }
}
