//! FILENAME: persistence/src/xlsx_writer.rs
//! Writes filtered transaction rows back out as a workbook: one sheet,
//! the ten canonical columns in order, and a trailing TOTAL row.

use std::path::Path;

use engine::{Record, Totals, COLUMNS};
use log::debug;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use crate::PersistenceError;

/// Number format applied to the four amount columns.
const AMOUNT_FORMAT: &str = "#,##0.00";

/// Column index of the Particulars field, where the TOTAL label goes.
const PARTICULARS_COL: u16 = 5;

/// First of the four amount columns.
const FIRST_AMOUNT_COL: u16 = 6;

const AMOUNT_COL_WIDTH: f64 = 15.0;

pub fn write_transactions(
    records: &[Record],
    totals: &Totals,
    path: &Path,
) -> Result<(), PersistenceError> {
    let mut workbook = build_workbook(records, totals)?;
    workbook.save(path)?;
    Ok(())
}

/// Serializes the workbook in memory, for callers that stream the bytes
/// instead of touching the filesystem.
pub fn write_transactions_to_buffer(
    records: &[Record],
    totals: &Totals,
) -> Result<Vec<u8>, PersistenceError> {
    let mut workbook = build_workbook(records, totals)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(records: &[Record], totals: &Totals) -> Result<XlsxWorkbook, PersistenceError> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Transactions")?;

    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format(AMOUNT_FORMAT);
    let total_label_format = Format::new().set_bold();
    let total_amount_format = Format::new().set_bold().set_num_format(AMOUNT_FORMAT);

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for offset in 0..4u16 {
        worksheet.set_column_width(FIRST_AMOUNT_COL + offset, AMOUNT_COL_WIDTH)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, record.date_key())?;
        worksheet.write_string(row, 1, &record.entity_type)?;
        worksheet.write_string(row, 2, &record.entity_sub_type)?;
        worksheet.write_string(row, 3, &record.entity_name)?;
        worksheet.write_string(row, 4, &record.voucher_type)?;
        worksheet.write_string(row, PARTICULARS_COL, &record.particulars)?;
        worksheet.write_number_with_format(row, 6, record.cash_dr, &amount_format)?;
        worksheet.write_number_with_format(row, 7, record.cash_cr, &amount_format)?;
        worksheet.write_number_with_format(row, 8, record.bank_dr, &amount_format)?;
        worksheet.write_number_with_format(row, 9, record.bank_cr, &amount_format)?;
    }

    let total_row = (records.len() + 1) as u32;
    worksheet.write_string_with_format(total_row, PARTICULARS_COL, "TOTAL", &total_label_format)?;
    worksheet.write_number_with_format(total_row, 6, totals.cash_dr, &total_amount_format)?;
    worksheet.write_number_with_format(total_row, 7, totals.cash_cr, &total_amount_format)?;
    worksheet.write_number_with_format(total_row, 8, totals.bank_dr, &total_amount_format)?;
    worksheet.write_number_with_format(total_row, 9, totals.bank_cr, &total_amount_format)?;

    debug!("built export workbook: {} rows plus totals", records.len());
    Ok(workbook)
}
