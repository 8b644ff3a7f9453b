//! # rehash-trie
//!
//! A byte-string keyed map built from fixed-width hash tables that nest on
//! collision.
//!
//! Each table has [`BUCKETS_PER_TABLE`] buckets. A key is placed at
//! `hash(key, round) % BUCKETS_PER_TABLE`, where `round` is the nesting depth
//! of the table. When two keys want the same bucket, the bucket becomes a
//! nested table and both keys are re-placed with the next round. There is no
//! probing and no chaining; a lookup follows exactly one bucket per level.
//!
//! Tables are allocated on first insertion and dropped as soon as their last
//! bucket is cleared, so a map whose keys have all been removed owns no heap
//! memory at all.
//!
//! ## Example
//!
//! ```rust
//! use rehash_trie::{RehashTrie, SetOutcome};
//!
//! let mut map: RehashTrie<u64> = RehashTrie::new();
//! assert!(matches!(map.set(b"hello", 1), Ok(SetOutcome::Inserted)));
//! assert!(matches!(map.set(b"hello", 2), Ok(SetOutcome::Updated(1))));
//!
//! assert_eq!(map.get(b"hello"), Some(&2));
//! assert_eq!(map.clear(b"hello"), Some(2));
//! assert_eq!(map.depth(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod dump;
mod error;
pub mod hash;
mod stats;
mod table;

pub use error::{Error, Result, SetError};
pub use stats::TableStats;

use std::fmt;
use std::io;

use table::{Bucket, Table};

// =============================================================================
// Configuration
// =============================================================================

/// Number of buckets in every table, root and nested alike.
pub const BUCKETS_PER_TABLE: usize = 31;

// =============================================================================
// Public types
// =============================================================================

/// Result of a successful [`RehashTrie::set`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOutcome<V> {
    /// The key was not present and has been added.
    Inserted,
    /// The key was present; its previous value is returned to the caller.
    Updated(V),
}

/// Result of [`RehashTrie::set`].
pub type SetResult<V> = std::result::Result<SetOutcome<V>, SetError<V>>;

/// View of a single bucket, as returned by [`RehashTrie::first_entry`].
#[derive(Debug, PartialEq, Eq)]
pub enum BucketRef<'a, V> {
    /// A key/value leaf.
    Leaf {
        /// Stored key.
        key: &'a [u8],
        /// Stored value.
        value: &'a V,
    },
    /// A nested table resolving a collision at this index.
    Nested,
}

/// Map from byte-string keys to values of type `V`.
pub struct RehashTrie<V> {
    root: Option<Table<V>>,
    count: usize,
}

impl<V> RehashTrie<V> {
    /// Create an empty map. Nothing is allocated until the first `set`.
    pub fn new() -> Self {
        Self {
            root: None,
            count: 0,
        }
    }

    /// Number of keys stored, across all levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the map holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        self.root.as_ref()?.get(key, 0)
    }

    /// Mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        self.root.as_mut()?.get_mut(key, 0)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Insert `key` or replace its value.
    ///
    /// Returns [`SetOutcome::Updated`] with the superseded value when the key
    /// was already present. If a key copy or a table cannot be allocated the
    /// map is left unchanged and a [`SetError`] holding
    /// [`Error::AllocationFailed`] and the rejected `value` is returned.
    pub fn set(&mut self, key: &[u8], value: V) -> SetResult<V> {
        let root = match &mut self.root {
            Some(root) => root,
            empty => match Table::try_new() {
                Ok(table) => empty.insert(table),
                Err(error) => return Err(SetError { error, value }),
            },
        };

        let outcome = root.set(key, value, 0);
        match &outcome {
            Ok(SetOutcome::Inserted) => self.count += 1,
            Ok(SetOutcome::Updated(_)) => {}
            // A freshly allocated root must not outlive a failed insertion.
            Err(_) if root.is_empty() => self.root = None,
            Err(_) => {}
        }
        outcome
    }

    /// Remove `key`, returning its value.
    ///
    /// Every table emptied by the removal is dropped, up to and including
    /// the root.
    pub fn clear(&mut self, key: &[u8]) -> Option<V> {
        let root = self.root.as_mut()?;
        let removed = root.clear(key, 0)?;
        if root.is_empty() {
            log::trace!("root table collapsed");
            self.root = None;
        }
        self.count -= 1;
        Some(removed)
    }

    /// Number of non-empty buckets in the root table only.
    pub fn entries(&self) -> usize {
        self.root.as_ref().map_or(0, Table::entries)
    }

    /// Nesting depth: 0 when nothing is allocated, 1 for a lone root table.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Table::depth)
    }

    /// Bucket counts across every level.
    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats::default();
        if let Some(root) = &self.root {
            root.accumulate_stats(&mut stats);
        }
        stats
    }

    /// Fraction of all buckets, across every level, that are empty.
    ///
    /// Always in `[0, 1)`; `0.0` when nothing is allocated.
    pub fn sparseness(&self) -> f64 {
        self.stats().sparseness()
    }

    /// First non-empty bucket of the root table, in index order.
    pub fn first_entry(&self) -> Option<BucketRef<'_, V>> {
        self.root
            .as_ref()?
            .buckets()
            .iter()
            .find_map(|bucket| match bucket {
                Bucket::Empty => None,
                Bucket::Leaf { key, value } => Some(BucketRef::Leaf { key: &key[..], value }),
                Bucket::Nested(_) => Some(BucketRef::Nested),
            })
    }

    /// Iterate over every `(key, value)` pair, depth first in bucket order.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut stack = Vec::new();
        if let Some(root) = &self.root {
            stack.push(root.buckets().iter());
        }
        Iter { stack }
    }
}

impl<V: fmt::Debug> RehashTrie<V> {
    /// Write an indented listing of every bucket to `out`.
    ///
    /// Each line holds the bucket index, then the key and value for leaves.
    /// Nested tables are listed under their index one level deeper.
    pub fn dump<W: io::Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        match &self.root {
            Some(root) => root.dump(out, 0),
            None => Ok(()),
        }
    }
}

impl<V> Default for RehashTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for RehashTrie<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            count: self.count,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RehashTrie<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}

/// Iterator over the entries of a [`RehashTrie`], from [`RehashTrie::iter`].
pub struct Iter<'a, V> {
    stack: Vec<std::slice::Iter<'a, Bucket<V>>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                None => {
                    self.stack.pop();
                }
                Some(Bucket::Empty) => {}
                Some(Bucket::Leaf { key, value }) => return Some((&key[..], value)),
                Some(Bucket::Nested(child)) => self.stack.push(child.buckets().iter()),
            }
        }
    }
}

impl<'a, V> IntoIterator for &'a RehashTrie<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
