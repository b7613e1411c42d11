//! FILENAME: engine/src/record.rs
//! The fixed transaction schema and its typed row representation.
//!
//! The input is a flat sheet with exactly ten known columns. Column order
//! and header names are significant on both import and export, so they are
//! defined once here and referenced everywhere else.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column headers of the input sheet, in the order they must appear.
pub const COLUMNS: [&str; 10] = [
    "Date",
    "Entity Type",
    "Entity Sub Type",
    "Entity Name",
    "Vch Type",
    "Particulars",
    "Cash Dr (R)",
    "Cash Cr (P)",
    "Bank Dr (R)",
    "Bank Cr (P)",
];

/// The four amount columns, tracked separately for cash and bank.
pub const AMOUNT_COLUMNS: [&str; 4] = [
    "Cash Dr (R)",
    "Cash Cr (P)",
    "Bank Dr (R)",
    "Bank Cr (P)",
];

// ============================================================================
// DIMENSIONS
// ============================================================================

/// One of the four filterable columns, in hierarchy order
/// (level 0 = Date ... level 3 = Entity Name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Date,
    EntityType,
    EntitySubType,
    EntityName,
}

impl Dimension {
    /// All dimensions in hierarchy order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Date,
        Dimension::EntityType,
        Dimension::EntitySubType,
        Dimension::EntityName,
    ];

    /// The sheet column header for this dimension.
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Date => "Date",
            Dimension::EntityType => "Entity Type",
            Dimension::EntitySubType => "Entity Sub Type",
            Dimension::EntityName => "Entity Name",
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// A single normalized transaction row.
///
/// All text fields are trimmed, never null (blank cells become empty
/// strings). All four amount fields are always present; cells that could
/// not be parsed as numbers were coerced to 0 by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub entity_type: String,
    pub entity_sub_type: String,
    pub entity_name: String,
    pub voucher_type: String,
    pub particulars: String,
    pub cash_dr: f64,
    pub cash_cr: f64,
    pub bank_dr: f64,
    pub bank_cr: f64,
}

impl Record {
    /// The date formatted the way it is keyed and displayed (ISO).
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// The grouping key for one dimension of this record.
    pub fn dimension_key(&self, dimension: Dimension) -> String {
        match dimension {
            Dimension::Date => self.date_key(),
            Dimension::EntityType => self.entity_type.clone(),
            Dimension::EntitySubType => self.entity_sub_type.clone(),
            Dimension::EntityName => self.entity_name.clone(),
        }
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// Elementwise sums of the four amount fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub cash_dr: f64,
    pub cash_cr: f64,
    pub bank_dr: f64,
    pub bank_cr: f64,
}

impl Totals {
    /// Accumulates one record's amounts.
    pub fn add_record(&mut self, record: &Record) {
        self.cash_dr += record.cash_dr;
        self.cash_cr += record.cash_cr;
        self.bank_dr += record.bank_dr;
        self.bank_cr += record.bank_cr;
    }

    /// Accumulates another set of sums.
    pub fn add(&mut self, other: &Totals) {
        self.cash_dr += other.cash_dr;
        self.cash_cr += other.cash_cr;
        self.bank_dr += other.bank_dr;
        self.bank_cr += other.bank_cr;
    }

    /// Sums a sequence of records in iteration order.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut totals = Totals::default();
        for record in records {
            totals.add_record(record);
        }
        totals
    }
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// A loosely typed cell as decoded by the external file parser.
/// Numbers in the `Date` column are interpreted as Excel serial dates.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

/// A decoded sheet: one header row plus data rows in file order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cash_dr: f64, bank_cr: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            entity_type: "Customer".to_string(),
            entity_sub_type: "Retail".to_string(),
            entity_name: "ABC Corp".to_string(),
            voucher_type: "Receipt".to_string(),
            particulars: "pay".to_string(),
            cash_dr,
            cash_cr: 0.0,
            bank_dr: 0.0,
            bank_cr,
        }
    }

    #[test]
    fn totals_accumulate_all_four_amounts() {
        let records = [record(100.0, 0.0), record(50.0, 200.0)];
        let totals = Totals::from_records(records.iter());
        assert_eq!(totals.cash_dr, 150.0);
        assert_eq!(totals.cash_cr, 0.0);
        assert_eq!(totals.bank_dr, 0.0);
        assert_eq!(totals.bank_cr, 200.0);
    }

    #[test]
    fn dimension_keys_follow_hierarchy_order() {
        let r = record(1.0, 0.0);
        assert_eq!(r.dimension_key(Dimension::Date), "2024-01-01");
        assert_eq!(r.dimension_key(Dimension::EntityType), "Customer");
        assert_eq!(r.dimension_key(Dimension::EntitySubType), "Retail");
        assert_eq!(r.dimension_key(Dimension::EntityName), "ABC Corp");
    }

    #[test]
    fn column_names_match_dimensions() {
        for dimension in Dimension::ALL {
            assert!(COLUMNS.contains(&dimension.column_name()));
        }
    }
}
