//! PDF text extraction.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{MetricsError, MetricsResult};

/// Source of per-page text for a PDF document.
pub trait PdfTextSource {
    /// Text of every page in order. Pages without text yield "".
    fn page_texts(&self, path: &Path) -> MetricsResult<Vec<String>>;
}

/// Page text extraction backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfSource;

impl PdfTextSource for LopdfSource {
    fn page_texts(&self, path: &Path) -> MetricsResult<Vec<String>> {
        if !path.exists() {
            return Err(MetricsError::not_found(path.display().to_string()));
        }
        let document =
            lopdf::Document::load(path).map_err(|e| MetricsError::pdf(path, e.to_string()))?;
        let pages = document.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::warn!(path = %path.display(), page = page_number, error = %e, "Page has no extractable text");
                    texts.push(String::new());
                }
            }
        }
        Ok(texts)
    }
}

/// Concatenated text of all pages, each trimmed and joined with `\n`.
pub fn extract_text_from_pdf(path: &Path) -> MetricsResult<String> {
    extract_text_from_pdf_with(&LopdfSource, path)
}

/// [`extract_text_from_pdf`] with an explicit text source.
pub fn extract_text_from_pdf_with(source: &dyn PdfTextSource, path: &Path) -> MetricsResult<String> {
    let pages = source.page_texts(path)?;
    Ok(pages.iter().map(|p| p.trim()).collect::<Vec<_>>().join("\n"))
}

/// `(path, text)` for every `*.pdf` below `directory`, sorted by path.
pub fn iter_pdf_texts(directory: &Path) -> MetricsResult<Vec<(PathBuf, String)>> {
    iter_pdf_texts_with(&LopdfSource, directory)
}

/// [`iter_pdf_texts`] with an explicit text source.
pub fn iter_pdf_texts_with(
    source: &dyn PdfTextSource,
    directory: &Path,
) -> MetricsResult<Vec<(PathBuf, String)>> {
    let paths = find_pdfs(directory)?;
    tracing::info!(directory = %directory.display(), documents = paths.len(), "Extracting PDF text");
    paths
        .into_iter()
        .map(|path| {
            let text = extract_text_from_pdf_with(source, &path)?;
            Ok((path, text))
        })
        .collect()
}

/// Sorted paths of `*.pdf` files below `directory`, hidden and ignored files included.
pub fn find_pdfs(directory: &Path) -> MetricsResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(MetricsError::not_found(directory.display().to_string()));
    }
    let mut paths = Vec::new();
    for entry in WalkBuilder::new(directory).standard_filters(false).build() {
        let entry = entry?;
        let path = entry.path();
        let is_pdf = path.extension().and_then(|e| e.to_str()) == Some("pdf");
        if is_pdf && entry.file_type().is_some_and(|t| t.is_file()) {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}
