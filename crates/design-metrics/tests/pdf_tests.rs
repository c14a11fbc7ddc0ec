//! PDF discovery and text extraction through a fake text source.

use std::fs;
use std::path::{Path, PathBuf};

use design_metrics::bib::pdf_text_with;
use design_metrics::io::{PdfTextSource, extract_text_from_pdf, extract_text_from_pdf_with, find_pdfs, iter_pdf_texts_with};
use design_metrics::{MetricsError, MetricsResult};
use serde_json::json;
use tempfile::TempDir;

/// Returns two pages per document, derived from the file name.
struct FakeSource;

impl PdfTextSource for FakeSource {
    fn page_texts(&self, path: &Path) -> MetricsResult<Vec<String>> {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Ok(vec![format!("  {stem} page one \n"), format!("{stem} page two")])
    }
}

fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
    fs::write(dir.path().join("nested").join("a.pdf"), b"%PDF-1.4").unwrap();
    fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();
    dir
}

#[test]
fn test_find_pdfs_recurses_and_sorts() {
    let dir = corpus();
    let found = find_pdfs(dir.path()).unwrap();
    let expected: Vec<PathBuf> = vec![dir.path().join("b.pdf"), dir.path().join("nested").join("a.pdf")];
    assert_eq!(found, expected);
}

#[test]
fn test_find_pdfs_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = find_pdfs(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, MetricsError::NotFound(_)));
}

#[test]
fn test_extract_text_joins_trimmed_pages() {
    let text = extract_text_from_pdf_with(&FakeSource, Path::new("paper.pdf")).unwrap();
    assert_eq!(text, "paper page one\npaper page two");
}

#[test]
fn test_iter_pdf_texts_with_source() {
    let dir = corpus();
    let texts = iter_pdf_texts_with(&FakeSource, dir.path()).unwrap();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].1.starts_with("b page one"));
    assert!(texts[1].1.starts_with("a page one"));
}

#[test]
fn test_pdf_text_table_has_page_rows() {
    let paths = vec![PathBuf::from("x/first.pdf"), PathBuf::from("second.pdf")];
    let table = pdf_text_with(&FakeSource, &paths).unwrap();
    assert_eq!(table.columns(), &["paper_id", "page", "text", "path"].map(String::from));
    assert_eq!(table.len(), 4);
    assert_eq!(table.row(1).get("page"), Some(&json!(1)));
    assert_eq!(table.row(0).text("text"), "first page one");
    assert_eq!(table.row(3).text("paper_id"), "second");
}

#[test]
fn test_missing_pdf_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = extract_text_from_pdf(&dir.path().join("absent.pdf")).unwrap_err();
    assert!(matches!(err, MetricsError::NotFound(_)));
}

#[test]
fn test_invalid_pdf_is_pdf_error() {
    let dir = corpus();
    let err = extract_text_from_pdf(&dir.path().join("b.pdf")).unwrap_err();
    assert!(matches!(err, MetricsError::Pdf { .. }));
}
