//! FILENAME: query-engine/src/view.rs
//! Serializable payload shapes returned by the query facade. These are
//! the structures a transport layer (HTTP handlers, IPC) would hand to
//! clients unchanged.

use chrono::NaiveDate;
use engine::{Record, Totals};
use serde::{Deserialize, Serialize};

/// The full answer to a filtered query: the matching rows in load order
/// plus their amount sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    pub totals: Totals,
    pub count: usize,
}

/// Totals without the row payload, served from the hierarchy tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalsSummary {
    pub count: u64,
    pub totals: Totals,
}

/// Distinct observed values per filterable dimension, each list sorted
/// ascending. Dates are ISO strings so lexical order is chronological.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub dates: Vec<String>,
    pub entity_types: Vec<String>,
    pub entity_sub_types: Vec<String>,
    pub entity_names: Vec<String>,
}

/// Inclusive span of dates observed in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Diagnostics from a completed load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Rows accepted into the dataset.
    pub row_count: usize,
    /// Rows skipped or cells coerced during normalization.
    pub warning_count: usize,
    /// `None` when the dataset is empty.
    pub date_range: Option<DateRange>,
    pub entity_type_count: usize,
    pub entity_sub_type_count: usize,
    pub entity_name_count: usize,
}

/// One child group at the first unconstrained hierarchy level, as shown
/// by a drill-down UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// The group's key at its level (ISO date string at level 0).
    pub key: String,
    /// Hierarchy level, 0 = date through 3 = entity name.
    pub level: u8,
    pub count: u64,
    pub totals: Totals,
    /// Whether the group can be drilled into further.
    pub has_children: bool,
}

/// Operational counters for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub row_count: usize,
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Milliseconds spent building the store and hierarchy on the last
    /// load.
    pub last_build_ms: u64,
    /// Incremented on every successful load.
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_result_serializes_rows_and_totals() {
        let result = QueryResult {
            rows: vec![Record {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                entity_type: "Customer".to_string(),
                entity_sub_type: "Retail".to_string(),
                entity_name: "ABC Corp".to_string(),
                voucher_type: "Receipt".to_string(),
                particulars: "payment".to_string(),
                cash_dr: 100.0,
                cash_cr: 0.0,
                bank_dr: 0.0,
                bank_cr: 0.0,
            }],
            totals: Totals {
                cash_dr: 100.0,
                ..Totals::default()
            },
            count: 1,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: QueryResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(json.contains("\"cash_dr\":100.0"));
    }

    #[test]
    fn load_summary_omits_range_for_empty_dataset() {
        let summary = LoadSummary {
            row_count: 0,
            warning_count: 0,
            date_range: None,
            entity_type_count: 0,
            entity_sub_type_count: 0,
            entity_name_count: 0,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"date_range\":null"));
    }
}
