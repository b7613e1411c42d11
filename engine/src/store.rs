//! FILENAME: engine/src/store.rs
//! The indexed in-memory store: the dataset plus one secondary index per
//! filterable dimension.
//!
//! Each index maps a dimension value to the sorted positions of the rows
//! holding it, so an exact-match filter is an intersection of posting
//! lists (driven by the smallest one) instead of a table scan. The same
//! indices back the distinct-value lists used to populate filter UIs.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::filter::FilterCriteria;
use crate::record::{Dimension, Record, Totals};

/// Row positions in load order. Always sorted ascending because rows are
/// appended during the build pass.
type RowSet = Vec<u32>;

#[derive(Debug, Default)]
pub struct IndexedStore {
    records: Vec<Record>,
    by_date: FxHashMap<NaiveDate, RowSet>,
    by_entity_type: FxHashMap<String, RowSet>,
    by_entity_sub_type: FxHashMap<String, RowSet>,
    by_entity_name: FxHashMap<String, RowSet>,
}

impl IndexedStore {
    /// Builds the store and all four indices in one pass.
    pub fn build(records: Vec<Record>) -> Self {
        let mut by_date: FxHashMap<NaiveDate, RowSet> = FxHashMap::default();
        let mut by_entity_type: FxHashMap<String, RowSet> = FxHashMap::default();
        let mut by_entity_sub_type: FxHashMap<String, RowSet> = FxHashMap::default();
        let mut by_entity_name: FxHashMap<String, RowSet> = FxHashMap::default();

        for (position, record) in records.iter().enumerate() {
            let position = position as u32;
            by_date.entry(record.date).or_default().push(position);
            by_entity_type
                .entry(record.entity_type.clone())
                .or_default()
                .push(position);
            by_entity_sub_type
                .entry(record.entity_sub_type.clone())
                .or_default()
                .push(position);
            by_entity_name
                .entry(record.entity_name.clone())
                .or_default()
                .push(position);
        }

        IndexedStore {
            records,
            by_date,
            by_entity_type,
            by_entity_sub_type,
            by_entity_name,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Row positions matching `criteria`, in load order.
    ///
    /// Constrained dimensions contribute their posting lists; the smallest
    /// list drives the intersection and the others are probed by binary
    /// search, so cost tracks the narrowest constraint rather than the
    /// table size.
    pub fn filter_positions(&self, criteria: &FilterCriteria) -> Vec<u32> {
        let mut lists: Vec<&RowSet> = Vec::with_capacity(4);

        if let Some(date) = criteria.date {
            match self.by_date.get(&date) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        if let Some(value) = &criteria.entity_type {
            match self.by_entity_type.get(value) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        if let Some(value) = &criteria.entity_sub_type {
            match self.by_entity_sub_type.get(value) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        if let Some(value) = &criteria.entity_name {
            match self.by_entity_name.get(value) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }

        if lists.is_empty() {
            return (0..self.records.len() as u32).collect();
        }

        lists.sort_by_key(|list| list.len());
        let smallest = lists[0];
        let rest = &lists[1..];

        smallest
            .iter()
            .copied()
            .filter(|position| rest.iter().all(|list| list.binary_search(position).is_ok()))
            .collect()
    }

    /// Records matching `criteria`, in load order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&Record> {
        self.filter_positions(criteria)
            .into_iter()
            .map(|position| &self.records[position as usize])
            .collect()
    }

    /// Distinct observed values for a dimension, sorted ascending. Dates
    /// are formatted ISO so lexical order is chronological.
    pub fn distinct_values(&self, dimension: Dimension) -> Vec<String> {
        let mut values: Vec<String> = match dimension {
            Dimension::Date => self
                .by_date
                .keys()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            Dimension::EntityType => self.by_entity_type.keys().cloned().collect(),
            Dimension::EntitySubType => self.by_entity_sub_type.keys().cloned().collect(),
            Dimension::EntityName => self.by_entity_name.keys().cloned().collect(),
        };
        values.sort();
        values
    }

    /// Sums the amount fields over a set of row positions, in position
    /// order.
    pub fn totals_for(&self, positions: &[u32]) -> Totals {
        let mut totals = Totals::default();
        for &position in positions {
            totals.add_record(&self.records[position as usize]);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, entity_type: &str, name: &str, cash_dr: f64) -> Record {
        Record {
            date: date.parse().unwrap(),
            entity_type: entity_type.to_string(),
            entity_sub_type: "Retail".to_string(),
            entity_name: name.to_string(),
            voucher_type: "Receipt".to_string(),
            particulars: String::new(),
            cash_dr,
            cash_cr: 0.0,
            bank_dr: 0.0,
            bank_cr: 0.0,
        }
    }

    fn sample_store() -> IndexedStore {
        IndexedStore::build(vec![
            record("2024-01-01", "Customer", "ABC Corp", 100.0),
            record("2024-01-01", "Customer", "DEF Inc", 50.0),
            record("2024-01-02", "Vendor", "ABC Corp", 25.0),
            record("2024-01-02", "Customer", "ABC Corp", 10.0),
        ])
    }

    #[test]
    fn unconstrained_filter_returns_all_rows_in_order() {
        let store = sample_store();
        let positions = store.filter_positions(&FilterCriteria::unfiltered());
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn intersection_preserves_load_order() {
        let store = sample_store();
        let criteria = FilterCriteria {
            entity_type: Some("Customer".to_string()),
            entity_name: Some("ABC Corp".to_string()),
            ..FilterCriteria::default()
        };
        let rows = store.filter(&criteria);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cash_dr, 100.0);
        assert_eq!(rows[1].cash_dr, 10.0);
    }

    #[test]
    fn unknown_value_yields_empty_result() {
        let store = sample_store();
        let criteria = FilterCriteria {
            entity_name: Some("Nobody".to_string()),
            ..FilterCriteria::default()
        };
        assert!(store.filter_positions(&criteria).is_empty());
    }

    #[test]
    fn filter_agrees_with_direct_matching() {
        let store = sample_store();
        let criteria = FilterCriteria {
            date: Some("2024-01-02".parse().unwrap()),
            entity_type: Some("Customer".to_string()),
            ..FilterCriteria::default()
        };
        let via_index: Vec<&Record> = store.filter(&criteria);
        let via_scan: Vec<&Record> = store
            .records()
            .iter()
            .filter(|r| criteria.matches(r))
            .collect();
        assert_eq!(via_index, via_scan);
    }

    #[test]
    fn distinct_values_are_sorted_ascending() {
        let store = sample_store();
        assert_eq!(
            store.distinct_values(Dimension::Date),
            vec!["2024-01-01", "2024-01-02"]
        );
        assert_eq!(
            store.distinct_values(Dimension::EntityType),
            vec!["Customer", "Vendor"]
        );
        assert_eq!(
            store.distinct_values(Dimension::EntityName),
            vec!["ABC Corp", "DEF Inc"]
        );
    }

    #[test]
    fn empty_store_serves_empty_results() {
        let store = IndexedStore::build(Vec::new());
        assert!(store.is_empty());
        assert!(store.filter_positions(&FilterCriteria::unfiltered()).is_empty());
        assert!(store.distinct_values(Dimension::EntityType).is_empty());

        let criteria = FilterCriteria {
            entity_type: Some("Customer".to_string()),
            ..FilterCriteria::default()
        };
        assert!(store.filter(&criteria).is_empty());
    }

    #[test]
    fn totals_for_sums_selected_positions() {
        let store = sample_store();
        let totals = store.totals_for(&[0, 3]);
        assert_eq!(totals.cash_dr, 110.0);
    }
}
