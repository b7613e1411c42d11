//! FILENAME: query-engine/src/hierarchy.rs
//! The 4-level aggregation tree:
//! Date -> Entity Type -> Entity Sub Type -> Entity Name.
//!
//! Built once per dataset in a single pass; every node carries the count
//! and the four amount sums of its subtree, so filtered totals are a
//! subtree walk instead of a row scan. A parent's count and sums always
//! equal the sum over its children, and the root equals the dataset.

use engine::{FilterCriteria, Record, Totals};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Depth of the grouping hierarchy (level 0 = date ... level 3 = entity
/// name).
pub const LEVELS: usize = 4;

/// One node of the aggregation tree. The root sits above level 0 and
/// carries the dataset-wide sums.
#[derive(Debug, Default)]
pub struct HierarchyNode {
    /// Number of records in this subtree.
    pub count: u64,
    /// Amount sums over this subtree.
    pub totals: Totals,
    children: FxHashMap<String, HierarchyNode>,
}

impl HierarchyNode {
    pub fn child(&self, key: &str) -> Option<&HierarchyNode> {
        self.children.get(key)
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &HierarchyNode)> {
        self.children.iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    fn accumulate(&mut self, record: &Record) {
        self.count += 1;
        self.totals.add_record(record);
    }
}

/// The rooted tree over the whole dataset.
#[derive(Debug, Default)]
pub struct HierarchyTree {
    root: HierarchyNode,
}

impl HierarchyTree {
    /// Single pass over the dataset; every ancestor on a record's key
    /// path accumulates its count and amounts on the way down.
    pub fn build(records: &[Record]) -> Self {
        let mut root = HierarchyNode::default();

        for record in records {
            let keys: SmallVec<[String; LEVELS]> = SmallVec::from_iter([
                record.date_key(),
                record.entity_type.clone(),
                record.entity_sub_type.clone(),
                record.entity_name.clone(),
            ]);

            root.accumulate(record);
            let mut node = &mut root;
            for key in keys {
                node = node.children.entry(key).or_default();
                node.accumulate(record);
            }
        }

        HierarchyTree { root }
    }

    pub fn root(&self) -> &HierarchyNode {
        &self.root
    }

    /// Totals and count for `criteria`, computed from the precomputed
    /// tree alone. Constrained levels descend into one child;
    /// unconstrained levels sum over all children that still satisfy the
    /// deeper constraints.
    pub fn totals(&self, criteria: &FilterCriteria) -> (Totals, u64) {
        let keys = criteria_keys(criteria);
        let mut totals = Totals::default();
        let mut count = 0u64;
        sum_subtree(&self.root, &keys, 0, &mut totals, &mut count);
        (totals, count)
    }

    /// The group nodes a tree UI shows under `criteria`: the children at
    /// the first unconstrained level below the constrained prefix, each
    /// restricted to the deeper constraints. Sorted ascending by key.
    pub fn group_summaries(&self, criteria: &FilterCriteria) -> Vec<crate::view::GroupSummary> {
        let keys = criteria_keys(criteria);

        // Descend through the constrained prefix of levels.
        let mut node = &self.root;
        let mut level = 0usize;
        while level < LEVELS {
            match &keys[level] {
                Some(key) => match node.child(key) {
                    Some(child) => {
                        node = child;
                        level += 1;
                    }
                    None => return Vec::new(),
                },
                None => break,
            }
        }
        if level >= LEVELS {
            // Every level pinned: nothing left to group by.
            return Vec::new();
        }

        let mut summaries: Vec<crate::view::GroupSummary> = node
            .children()
            .filter_map(|(key, child)| {
                let mut totals = Totals::default();
                let mut count = 0u64;
                sum_subtree(child, &keys, level + 1, &mut totals, &mut count);
                if count == 0 {
                    return None;
                }
                Some(crate::view::GroupSummary {
                    key: key.clone(),
                    level: level as u8,
                    count,
                    totals,
                    has_children: level + 1 < LEVELS,
                })
            })
            .collect();

        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }
}

/// The per-level key constraints of a filter, in hierarchy order.
fn criteria_keys(criteria: &FilterCriteria) -> [Option<String>; LEVELS] {
    [
        criteria.date.map(|d| d.format("%Y-%m-%d").to_string()),
        criteria.entity_type.clone(),
        criteria.entity_sub_type.clone(),
        criteria.entity_name.clone(),
    ]
}

fn sum_subtree(
    node: &HierarchyNode,
    keys: &[Option<String>; LEVELS],
    level: usize,
    totals: &mut Totals,
    count: &mut u64,
) {
    // No deeper constraint: this node's own sums are exact.
    if keys[level..].iter().all(|key| key.is_none()) {
        totals.add(&node.totals);
        *count += node.count;
        return;
    }

    match &keys[level] {
        Some(key) => {
            if let Some(child) = node.child(key) {
                sum_subtree(child, keys, level + 1, totals, count);
            }
        }
        None => {
            for (_, child) in node.children() {
                sum_subtree(child, keys, level + 1, totals, count);
            }
        }
    }
}
