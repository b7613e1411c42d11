//! FILENAME: persistence/src/xlsx_reader.rs
//! Decodes a transaction sheet into the loosely typed table the loader
//! normalizes. Only the first worksheet is read; typing and validation
//! belong to the loader, so every cell maps to a `RawValue` verbatim.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use engine::{RawTable, RawValue};
use log::debug;

use crate::PersistenceError;

pub fn read_transactions(path: &Path) -> Result<RawTable, PersistenceError> {
    let workbook: Xlsx<_> = open_workbook(path)?;
    read_first_sheet(workbook)
}

/// Same decoding over an already-opened workbook, e.g. from an in-memory
/// buffer.
pub fn read_first_sheet<R: Read + Seek>(
    mut workbook: Xlsx<R>,
) -> Result<RawTable, PersistenceError> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PersistenceError::InvalidFormat("workbook contains no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_text).collect(),
        None => {
            return Err(PersistenceError::InvalidFormat(
                "worksheet has no header row".to_string(),
            ))
        }
    };

    let data_rows: Vec<Vec<RawValue>> = rows
        .map(|row| row.iter().map(decode_cell).collect())
        .collect();

    debug!(
        "decoded sheet '{}': {} columns, {} data rows",
        sheet_name,
        headers.len(),
        data_rows.len()
    );

    Ok(RawTable {
        headers,
        rows: data_rows,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn decode_cell(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Empty,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Float(f) => RawValue::Number(*f),
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Bool(b) => RawValue::Text(b.to_string()),
        Data::Error(e) => RawValue::Text(format!("{:?}", e)),
        // Excel stores dates as serial numbers; the loader interprets
        // them in the Date column.
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => RawValue::Text(s.clone()),
        Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_cells_decode_verbatim() {
        assert_eq!(
            decode_cell(&Data::String("  ABC Corp ".to_string())),
            RawValue::Text("  ABC Corp ".to_string())
        );
    }

    #[test]
    fn numeric_cells_decode_to_numbers() {
        assert_eq!(decode_cell(&Data::Float(1500.25)), RawValue::Number(1500.25));
        assert_eq!(decode_cell(&Data::Int(10)), RawValue::Number(10.0));
    }

    #[test]
    fn empty_cells_stay_empty() {
        assert_eq!(decode_cell(&Data::Empty), RawValue::Empty);
    }
}
