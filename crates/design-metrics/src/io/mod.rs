//! Input and output connectors: BibTeX, PDF text and reference exports.

mod bibtex;
mod export;
mod pdf;

pub use bibtex::{BibEntry, entries_to_table, parse_bibtex_entries};
pub use export::export_papers;
pub use pdf::{
    LopdfSource, PdfTextSource, extract_text_from_pdf, extract_text_from_pdf_with, find_pdfs,
    iter_pdf_texts, iter_pdf_texts_with,
};
