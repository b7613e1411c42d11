//! FILENAME: query-engine/src/lib.rs
//! Hierarchical aggregation and cached querying over the loaded dataset.
//!
//! This crate sits on top of `engine` (records, loader, indexed store)
//! and owns everything query-shaped. It depends on `engine` only for the
//! record model and the store.
//!
//! Layers:
//! - `hierarchy`: the precomputed 4-level grouping tree (HOW totals stay cheap)
//! - `cache`: bounded LRU cache of full query results (HOW repeats stay cheap)
//! - `query`: the query facade owning the active dataset (WHAT callers use)
//! - `view`: serializable payload shapes (WHAT the transport layer sees)

pub mod cache;
pub mod hierarchy;
pub mod query;
pub mod view;

pub use cache::{ResultCache, DEFAULT_CACHE_CAPACITY};
pub use hierarchy::{HierarchyNode, HierarchyTree, LEVELS};
pub use query::QueryEngine;
pub use view::{
    DateRange, EngineStats, FilterOptions, GroupSummary, LoadSummary, QueryResult, TotalsSummary,
};
