#![no_main]

use design_metrics::Table;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = Table::from_csv_reader(data) {
        let _ = table.to_csv_string();
        let _ = table.to_value();
    }
});
