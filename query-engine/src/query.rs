//! FILENAME: query-engine/src/query.rs
//! The query facade owning the active dataset.
//!
//! A load builds an immutable bundle (indexed store, hierarchy tree,
//! fresh result cache) and swaps it in under a write lock, so queries on
//! the old dataset finish against the old bundle and the cache can never
//! serve a result from a previous generation. Reads take the lock
//! shared; only the cache needs its own mutex because hits update
//! recency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use std::time::Instant;

use engine::{Dimension, FilterCriteria, IndexedStore, LoadOutcome, Totals};
use log::{debug, error, info};

use crate::cache::{ResultCache, DEFAULT_CACHE_CAPACITY};
use crate::hierarchy::HierarchyTree;
use crate::view::{
    DateRange, EngineStats, FilterOptions, GroupSummary, LoadSummary, QueryResult, TotalsSummary,
};

/// Everything derived from one loaded dataset. Replaced wholesale on
/// reload.
struct DatasetState {
    store: IndexedStore,
    hierarchy: HierarchyTree,
    cache: Mutex<ResultCache>,
    build_ms: u64,
}

pub struct QueryEngine {
    state: RwLock<Option<DatasetState>>,
    cache_capacity: usize,
    generation: AtomicU64,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(cache_capacity: usize) -> Self {
        QueryEngine {
            state: RwLock::new(None),
            cache_capacity,
            generation: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Replaces the active dataset with the given load outcome. The old
    /// store, hierarchy and cache are dropped together.
    pub fn load(&self, outcome: LoadOutcome) -> LoadSummary {
        let started = Instant::now();

        let store = IndexedStore::build(outcome.records);
        let hierarchy = HierarchyTree::build(store.records());
        let build_ms = started.elapsed().as_millis() as u64;

        let summary = LoadSummary {
            row_count: store.len(),
            warning_count: outcome.warning_count,
            date_range: date_range(&store),
            entity_type_count: store.distinct_values(Dimension::EntityType).len(),
            entity_sub_type_count: store.distinct_values(Dimension::EntitySubType).len(),
            entity_name_count: store.distinct_values(Dimension::EntityName).len(),
        };

        let state = DatasetState {
            store,
            hierarchy,
            cache: Mutex::new(ResultCache::new(self.cache_capacity)),
            build_ms,
        };

        *write_lock(&self.state) = Some(state);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "loaded dataset generation {}: {} rows, {} warnings, built in {} ms",
            generation, summary.row_count, summary.warning_count, build_ms
        );
        summary
    }

    pub fn is_loaded(&self) -> bool {
        read_lock(&self.state).is_some()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Runs a filtered query, serving repeats from the result cache.
    ///
    /// Cached totals are re-checked against the hierarchy tree before
    /// being served; on a mismatch the cache is discarded and the result
    /// recomputed from the store.
    pub fn query(&self, criteria: &FilterCriteria) -> Arc<QueryResult> {
        let guard = read_lock(&self.state);
        let state = match guard.as_ref() {
            Some(state) => state,
            None => return Arc::new(empty_result()),
        };

        let (tree_totals, tree_count) = state.hierarchy.totals(criteria);

        if let Some(cached) = lock_cache(state).get(criteria) {
            if cached.totals == tree_totals && cached.count as u64 == tree_count {
                return cached;
            }
            error!(
                "cached result for {:?} disagrees with the hierarchy tree, discarding cache",
                criteria
            );
            lock_cache(state).clear();
        }

        let result = Arc::new(compute_result(state, criteria, tree_totals, tree_count));
        lock_cache(state).insert(criteria.clone(), Arc::clone(&result));
        result
    }

    /// Totals and count only, answered from the hierarchy tree without
    /// materializing rows.
    pub fn query_totals(&self, criteria: &FilterCriteria) -> TotalsSummary {
        let guard = read_lock(&self.state);
        match guard.as_ref() {
            Some(state) => {
                let (totals, count) = state.hierarchy.totals(criteria);
                TotalsSummary { count, totals }
            }
            None => TotalsSummary {
                count: 0,
                totals: Totals::default(),
            },
        }
    }

    /// The child groups at the first unconstrained hierarchy level.
    pub fn group_summaries(&self, criteria: &FilterCriteria) -> Vec<GroupSummary> {
        let guard = read_lock(&self.state);
        match guard.as_ref() {
            Some(state) => state.hierarchy.group_summaries(criteria),
            None => Vec::new(),
        }
    }

    /// Distinct values per dimension for populating filter dropdowns.
    pub fn filter_options(&self) -> FilterOptions {
        let guard = read_lock(&self.state);
        match guard.as_ref() {
            Some(state) => FilterOptions {
                dates: state.store.distinct_values(Dimension::Date),
                entity_types: state.store.distinct_values(Dimension::EntityType),
                entity_sub_types: state.store.distinct_values(Dimension::EntitySubType),
                entity_names: state.store.distinct_values(Dimension::EntityName),
            },
            None => FilterOptions::default(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        let guard = read_lock(&self.state);
        match guard.as_ref() {
            Some(state) => {
                let cache = lock_cache(state);
                EngineStats {
                    row_count: state.store.len(),
                    cache_entries: cache.len(),
                    cache_hits: cache.hits(),
                    cache_misses: cache.misses(),
                    last_build_ms: state.build_ms,
                    generation: self.generation.load(Ordering::SeqCst),
                }
            }
            None => EngineStats::default(),
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// INTERNALS
// ============================================================================

fn compute_result(
    state: &DatasetState,
    criteria: &FilterCriteria,
    tree_totals: Totals,
    tree_count: u64,
) -> QueryResult {
    let rows: Vec<_> = state
        .store
        .filter(criteria)
        .into_iter()
        .cloned()
        .collect();
    if rows.is_empty() {
        debug!("query {:?} matched no rows", criteria);
    }

    debug_assert_eq!(rows.len() as u64, tree_count);
    debug_assert!(totals_close(&Totals::from_records(rows.iter()), &tree_totals));

    QueryResult {
        count: rows.len(),
        totals: tree_totals,
        rows,
    }
}

fn empty_result() -> QueryResult {
    QueryResult {
        rows: Vec::new(),
        totals: Totals::default(),
        count: 0,
    }
}

fn date_range(store: &IndexedStore) -> Option<DateRange> {
    let start = store.records().iter().map(|r| r.date).min()?;
    let end = store.records().iter().map(|r| r.date).max()?;
    Some(DateRange { start, end })
}

/// Row-order summation and the tree walk may associate float additions
/// differently, so the debug check tolerates rounding noise.
fn totals_close(a: &Totals, b: &Totals) -> bool {
    fn close(x: f64, y: f64) -> bool {
        (x - y).abs() <= 1e-6 * (1.0 + x.abs().max(y.abs()))
    }
    close(a.cash_dr, b.cash_dr)
        && close(a.cash_cr, b.cash_cr)
        && close(a.bank_dr, b.bank_dr)
        && close(a.bank_cr, b.bank_cr)
}

// Lock poisoning only happens after a panic in another thread; the data
// under these locks is still structurally valid, so recover the guard.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn lock_cache(state: &DatasetState) -> MutexGuard<'_, ResultCache> {
    state.cache.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use engine::{load_records, RawTable, RawValue, COLUMNS};

    fn raw_row(date: &str, entity_type: &str, name: &str, cash_dr: f64) -> Vec<RawValue> {
        vec![
            RawValue::Text(date.to_string()),
            RawValue::Text(entity_type.to_string()),
            RawValue::Text("Retail".to_string()),
            RawValue::Text(name.to_string()),
            RawValue::Text("Receipt".to_string()),
            RawValue::Text("payment".to_string()),
            RawValue::Number(cash_dr),
            RawValue::Empty,
            RawValue::Empty,
            RawValue::Empty,
        ]
    }

    fn loaded_engine() -> QueryEngine {
        let table = RawTable {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![
                raw_row("2024-01-01", "Customer", "ABC Corp", 100.0),
                raw_row("2024-01-01", "Customer", "DEF Inc", 50.0),
                raw_row("2024-01-02", "Vendor", "ABC Corp", 25.0),
            ],
        };
        let engine = QueryEngine::new();
        engine.load(load_records(&table).unwrap());
        engine
    }

    #[test]
    fn load_summary_reports_diagnostics() {
        let engine = loaded_engine();
        assert!(engine.is_loaded());

        let stats = engine.stats();
        assert_eq!(stats.row_count, 3);
        assert_eq!(stats.generation, 1);

        let options = engine.filter_options();
        assert_eq!(options.dates, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(options.entity_types, vec!["Customer", "Vendor"]);
    }

    #[test]
    fn load_summary_includes_date_range() {
        let table = RawTable {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![
                raw_row("2024-01-05", "Customer", "ABC Corp", 1.0),
                raw_row("2024-01-02", "Vendor", "XYZ Ltd", 2.0),
            ],
        };
        let engine = QueryEngine::new();
        let summary = engine.load(load_records(&table).unwrap());
        let range = summary.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(summary.entity_type_count, 2);
        assert_eq!(summary.entity_name_count, 2);
    }

    #[test]
    fn repeated_query_is_served_from_cache() {
        let engine = loaded_engine();
        let criteria = FilterCriteria {
            entity_type: Some("Customer".to_string()),
            ..FilterCriteria::default()
        };

        let first = engine.query(&criteria);
        let second = engine.query(&criteria);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = engine.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_entries, 1);
    }

    #[test]
    fn query_totals_match_row_sums() {
        let engine = loaded_engine();
        let criteria = FilterCriteria {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..FilterCriteria::default()
        };
        let result = engine.query(&criteria);
        assert_eq!(result.count, 2);
        assert_eq!(result.totals.cash_dr, 150.0);
        assert_eq!(
            result.totals,
            Totals::from_records(result.rows.iter())
        );

        let totals = engine.query_totals(&criteria);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.totals, result.totals);
    }

    #[test]
    fn reload_discards_cached_results() {
        let engine = loaded_engine();
        let criteria = FilterCriteria::unfiltered();
        assert_eq!(engine.query(&criteria).count, 3);

        let table = RawTable {
            headers: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![raw_row("2024-02-01", "Customer", "New Co", 9.0)],
        };
        engine.load(load_records(&table).unwrap());

        let result = engine.query(&criteria);
        assert_eq!(result.count, 1);
        assert_eq!(result.totals.cash_dr, 9.0);
        assert_eq!(engine.stats().generation, 2);
    }

    #[test]
    fn unloaded_engine_answers_empty() {
        let engine = QueryEngine::new();
        assert!(!engine.is_loaded());
        assert_eq!(engine.query(&FilterCriteria::unfiltered()).count, 0);
        assert_eq!(engine.query_totals(&FilterCriteria::unfiltered()).count, 0);
        assert!(engine.group_summaries(&FilterCriteria::unfiltered()).is_empty());
        assert_eq!(engine.filter_options(), FilterOptions::default());
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn group_summaries_come_from_the_tree() {
        let engine = loaded_engine();
        let groups = engine.group_summaries(&FilterCriteria::unfiltered());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "2024-01-01");
        assert_eq!(groups[0].count, 2);
    }
}
