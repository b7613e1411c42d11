//! FILENAME: persistence/src/lib.rs
//! File I/O for the transaction engine: XLSX import on the way in, XLSX
//! export of filtered views on the way out.

pub mod error;
pub mod export;
pub mod xlsx_reader;
pub mod xlsx_writer;

pub use error::PersistenceError;
pub use export::{export_query, export_query_to_file};
pub use xlsx_reader::{read_first_sheet, read_transactions};
pub use xlsx_writer::{write_transactions, write_transactions_to_buffer};

use std::path::Path;

use engine::{load_records, LoadOutcome};

/// Reads a transaction workbook and normalizes it into typed records.
pub fn load_file(path: &Path) -> Result<LoadOutcome, PersistenceError> {
    let table = read_transactions(path)?;
    Ok(load_records(&table)?)
}
