#![no_main]

use design_metrics::text::rake_keywords;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let keywords = rake_keywords(&text, 10);
    assert!(keywords.len() <= 10);
});
