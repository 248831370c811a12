//! Parse functions - transform raw d-portal CSV text into a Table

use crate::iati::types::Table;
use tracing::{debug, warn};

/// Parse CSV text (header row + data rows) into a rectangular Table.
///
/// Never fails: empty or header-less input yields an empty table. Missing cells are
/// filled with `""`, surplus cells are dropped.
pub fn load(raw_text: &str) -> Table {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw_text.as_bytes());

    let header: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.to_string()).collect(),
        Err(e) => {
            warn!("Failed to read CSV header: {}", e);
            return Table::default();
        }
    };

    if header.iter().all(|h| h.trim().is_empty()) {
        return Table::default();
    }

    let width = header.len();
    let mut rows = Vec::new();
    let mut parse_errors = 0;

    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let mut row: Vec<String> = record.iter().take(width).map(String::from).collect();
                row.resize(width, String::new());
                rows.push(row);
            }
            Err(e) => {
                parse_errors += 1;
                if parse_errors <= 10 {
                    // Only log first 10 errors
                    warn!("Failed to parse row {}: {}", idx, e);
                }
            }
        }
    }

    debug!(
        "Parsed {} rows x {} columns ({} errors)",
        rows.len(),
        width,
        parse_errors
    );

    Table::new(header, rows)
}
