//! Fuzzing library for design-metrics.
//!
//! Targets cover the parsers that read untrusted input: BibTeX files,
//! CSV tables and free text handed to RAKE.
//!
//! # Usage
//!
//! ```bash
//! cd crates/design-metrics-fuzz
//! cargo +nightly fuzz run fuzz_bibtex_parse -- -max_total_time=60
//! ```

pub use design_metrics::{io, table, text};
