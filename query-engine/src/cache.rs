//! FILENAME: query-engine/src/cache.rs
//! Bounded LRU cache for full query results, keyed by the filter tuple.
//!
//! The cache lives inside the dataset state and is dropped with it on
//! reload, so an entry can never outlive the dataset generation that
//! produced it. Capacity is a few dozen entries; eviction removes the
//! least recently used entry, never the most recently inserted or hit.

use std::sync::Arc;

use engine::FilterCriteria;
use log::debug;
use rustc_hash::FxHashMap;

use crate::view::QueryResult;

/// Default maximum number of cached filter combinations.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

struct Slot {
    result: Arc<QueryResult>,
    last_used: u64,
}

pub struct ResultCache {
    entries: FxHashMap<FilterCriteria, Slot>,
    capacity: usize,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        ResultCache {
            entries: FxHashMap::default(),
            capacity: capacity.max(1),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up a cached result and refreshes its recency on a hit.
    pub fn get(&mut self, criteria: &FilterCriteria) -> Option<Arc<QueryResult>> {
        self.tick += 1;
        match self.entries.get_mut(criteria) {
            Some(slot) => {
                slot.last_used = self.tick;
                self.hits += 1;
                Some(Arc::clone(&slot.result))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts a freshly computed result, evicting the least recently
    /// used entry when the cache is full.
    pub fn insert(&mut self, criteria: FilterCriteria, result: Arc<QueryResult>) {
        self.tick += 1;
        if !self.entries.contains_key(&criteria) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(
            criteria,
            Slot {
                result,
                last_used: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        // Capacity is small; a linear scan beats maintaining a separate
        // recency list.
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(criteria, _)| criteria.clone());
        if let Some(criteria) = victim {
            debug!("evicting cached result for {:?}", criteria);
            self.entries.remove(&criteria);
        }
    }

    /// Discards every entry. Used when a consistency violation is
    /// detected; reloads drop the whole cache structurally instead.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
