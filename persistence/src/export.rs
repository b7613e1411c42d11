//! FILENAME: persistence/src/export.rs
//! Bridges the query facade and the workbook writer: run a filtered
//! query, serialize the matching rows with their totals.

use std::path::Path;

use engine::FilterCriteria;
use log::info;
use query_engine::QueryEngine;

use crate::xlsx_writer::{write_transactions, write_transactions_to_buffer};
use crate::PersistenceError;

/// Exports the rows matching `criteria` as workbook bytes. Rides the
/// engine's result cache, so exporting the view a user is looking at
/// does not recompute it.
pub fn export_query(
    engine: &QueryEngine,
    criteria: &FilterCriteria,
) -> Result<Vec<u8>, PersistenceError> {
    let result = engine.query(criteria);
    info!("exporting {} filtered rows", result.count);
    write_transactions_to_buffer(&result.rows, &result.totals)
}

/// Same export written straight to a file.
pub fn export_query_to_file(
    engine: &QueryEngine,
    criteria: &FilterCriteria,
    path: &Path,
) -> Result<(), PersistenceError> {
    let result = engine.query(criteria);
    info!("exporting {} filtered rows to {}", result.count, path.display());
    write_transactions(&result.rows, &result.totals, path)
}
