#![no_main]

use design_metrics::io::{entries_to_table, parse_bibtex_entries};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must be an error, never a panic
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(entries) = parse_bibtex_entries(text) {
            let _ = entries_to_table(&entries);
        }
    }
});
