//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the transaction data engine.
//! CONTEXT: Typed record model, loader/normalizer and indexed store.
//! Re-exports public types and modules for use by other crates.

pub mod error;
pub mod filter;
pub mod loader;
pub mod record;
pub mod store;

// Re-export commonly used types at the crate root
pub use error::EngineError;
pub use filter::FilterCriteria;
pub use loader::{load_records, LoadOutcome};
pub use record::{Dimension, RawTable, RawValue, Record, Totals, AMOUNT_COLUMNS, COLUMNS};
pub use store::IndexedStore;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_row(date: &str, entity_type: &str, amount: f64) -> Vec<RawValue> {
        vec![
            RawValue::Text(date.to_string()),
            RawValue::Text(entity_type.to_string()),
            RawValue::Text("Retail".to_string()),
            RawValue::Text("ABC Corp".to_string()),
            RawValue::Text("Receipt".to_string()),
            RawValue::Text("payment".to_string()),
            RawValue::Number(amount),
            RawValue::Empty,
            RawValue::Empty,
            RawValue::Empty,
        ]
    }

    #[test]
    fn integration_test_load_and_filter_workflow() {
        let table = RawTable {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![
                raw_row("2024-01-01", "Customer", 100.0),
                raw_row("2024-01-01", "Customer", 50.0),
                raw_row("2024-01-02", "Vendor", 25.0),
            ],
        };

        let outcome = load_records(&table).unwrap();
        assert_eq!(outcome.row_count, 3);
        assert_eq!(outcome.warning_count, 0);

        let store = IndexedStore::build(outcome.records);
        let criteria = FilterCriteria {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FilterCriteria::default()
        };
        let rows = store.filter(&criteria);
        assert_eq!(rows.len(), 2);

        let mut totals = Totals::default();
        for row in &rows {
            totals.add_record(row);
        }
        assert_eq!(totals.cash_dr, 150.0);
    }
}
