//! Structural statistics over a table and everything nested below it.

use crate::table::{Bucket, Table};

/// Bucket counts accumulated across every level of a [`RehashTrie`](crate::RehashTrie).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Buckets holding a nested table.
    pub tables: usize,
    /// Buckets holding a key/value leaf.
    pub entries: usize,
    /// Empty buckets.
    pub nulls: usize,
    /// Largest single heap block owned by the structure, in bytes. Either a
    /// key copy or a table's bucket array.
    pub largest_allocation: usize,
}

impl TableStats {
    /// Total buckets counted, across all levels.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.tables + self.entries + self.nulls
    }

    /// Fraction of buckets that are empty, or `0.0` when nothing was counted.
    pub fn sparseness(&self) -> f64 {
        match self.buckets() {
            0 => 0.0,
            total => self.nulls as f64 / total as f64,
        }
    }
}

impl<V> Table<V> {
    /// Depth of this table: 1 plus the deepest nested child.
    pub(crate) fn depth(&self) -> usize {
        1 + self
            .buckets()
            .iter()
            .filter_map(|b| match b {
                Bucket::Nested(child) => Some(child.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn accumulate_stats(&self, stats: &mut TableStats) {
        stats.largest_allocation = stats.largest_allocation.max(self.allocation_size());
        for bucket in self.buckets() {
            match bucket {
                Bucket::Empty => stats.nulls += 1,
                Bucket::Leaf { key, .. } => {
                    stats.entries += 1;
                    stats.largest_allocation = stats.largest_allocation.max(key.len());
                }
                Bucket::Nested(child) => {
                    stats.tables += 1;
                    child.accumulate_stats(stats);
                }
            }
        }
    }
}
