//! FILENAME: engine/src/loader.rs
//! Converts decoded sheet rows into validated, typed records.
//!
//! Normalization contract:
//! - All ten expected column headers must be present (any order).
//! - Text cells are trimmed; blank becomes an empty string, never null.
//! - Amount cells parse to f64; blank or unparseable becomes exactly 0,
//!   with unparseable non-blank cells counted as coercion warnings.
//! - Date cells accept ISO, day-first and Excel-serial representations.
//!   A non-blank unparseable date aborts the load; a blank date drops the
//!   row and counts as a warning (every record must carry a date).

use chrono::{Duration, NaiveDate};
use log::{debug, info};

use crate::error::EngineError;
use crate::record::{RawTable, RawValue, Record, COLUMNS};

/// Text date formats accepted in the Date column, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Largest Excel serial we accept (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Result of a successful load: the normalized rows plus diagnostics.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Normalized records in file order.
    pub records: Vec<Record>,
    /// Number of records produced (equals `records.len()`).
    pub row_count: usize,
    /// Cells coerced to a default: unparseable amounts and dropped
    /// blank-date rows.
    pub warning_count: usize,
}

/// Normalizes a decoded sheet into typed records.
///
/// Pure with respect to any previously loaded dataset: errors leave the
/// caller's state untouched.
pub fn load_records(table: &RawTable) -> Result<LoadOutcome, EngineError> {
    let positions = column_positions(&table.headers)?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut warning_count = 0usize;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let date = match parse_date(cell(row, positions[0])) {
            DateParse::Date(d) => d,
            DateParse::Blank => {
                debug!("row {}: blank date, row skipped", row_idx);
                warning_count += 1;
                continue;
            }
            DateParse::Invalid(value) => {
                return Err(EngineError::InvalidDate { row: row_idx, value });
            }
        };

        records.push(Record {
            date,
            entity_type: coerce_text(cell(row, positions[1])),
            entity_sub_type: coerce_text(cell(row, positions[2])),
            entity_name: coerce_text(cell(row, positions[3])),
            voucher_type: coerce_text(cell(row, positions[4])),
            particulars: coerce_text(cell(row, positions[5])),
            cash_dr: coerce_amount(cell(row, positions[6]), &mut warning_count),
            cash_cr: coerce_amount(cell(row, positions[7]), &mut warning_count),
            bank_dr: coerce_amount(cell(row, positions[8]), &mut warning_count),
            bank_cr: coerce_amount(cell(row, positions[9]), &mut warning_count),
        });
    }

    info!(
        "loaded {} records ({} coercion warnings)",
        records.len(),
        warning_count
    );

    Ok(LoadOutcome {
        row_count: records.len(),
        warning_count,
        records,
    })
}

/// Maps each expected column to its position in the header row.
fn column_positions(headers: &[String]) -> Result<[usize; 10], EngineError> {
    let mut positions = [0usize; 10];
    let mut missing = Vec::new();

    for (i, name) in COLUMNS.iter().enumerate() {
        match headers.iter().position(|h| h.trim() == *name) {
            Some(p) => positions[i] = p,
            None => missing.push((*name).to_string()),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(EngineError::MissingColumns(missing))
    }
}

/// Short rows read as trailing empty cells.
fn cell(row: &[RawValue], position: usize) -> &RawValue {
    static EMPTY: RawValue = RawValue::Empty;
    row.get(position).unwrap_or(&EMPTY)
}

fn coerce_text(value: &RawValue) -> String {
    match value {
        RawValue::Empty => String::new(),
        RawValue::Text(s) => s.trim().to_string(),
        RawValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

fn coerce_amount(value: &RawValue, warning_count: &mut usize) -> f64 {
    match value {
        RawValue::Empty => 0.0,
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return 0.0;
            }
            match trimmed.replace(',', "").parse::<f64>() {
                Ok(n) => n,
                Err(_) => {
                    *warning_count += 1;
                    0.0
                }
            }
        }
        RawValue::Date(_) => {
            *warning_count += 1;
            0.0
        }
    }
}

enum DateParse {
    Date(NaiveDate),
    Blank,
    Invalid(String),
}

fn parse_date(value: &RawValue) -> DateParse {
    match value {
        RawValue::Date(d) => DateParse::Date(*d),
        RawValue::Empty => DateParse::Blank,
        RawValue::Number(serial) => match from_excel_serial(*serial) {
            Some(d) => DateParse::Date(d),
            None => DateParse::Invalid(serial.to_string()),
        },
        RawValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return DateParse::Blank;
            }
            for format in DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
                    return DateParse::Date(d);
                }
            }
            DateParse::Invalid(trimmed.to_string())
        }
    }
}

/// Excel 1900 date system: serial 1 is 1899-12-31; time-of-day fractions
/// are truncated.
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)))
}
