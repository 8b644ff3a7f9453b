//! Fixed-width bucket tables and the recursive collision scheme.
//!
//! A table is exactly [`BUCKETS_PER_TABLE`] buckets. A key lives in bucket
//! `bucket_index(key, round)` of the table at nesting level `round`. When two
//! keys want the same bucket, the bucket is replaced by a nested table one
//! level deeper and both keys are re-placed with `round + 1`.
//!
//! A table that no longer holds anything is dropped by whoever owns it: the
//! parent bucket reverts to `Empty`, or the map drops its root.

use std::mem;

use crate::error::{Error, Result, SetError};
use crate::hash::bucket_index;
use crate::{SetOutcome, SetResult, BUCKETS_PER_TABLE};

pub(crate) enum Bucket<V> {
    Empty,
    Leaf { key: Box<[u8]>, value: V },
    Nested(Table<V>),
}

impl<V> Bucket<V> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Bucket::Empty)
    }

    fn into_value(self) -> Option<V> {
        match self {
            Bucket::Leaf { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl<V: Clone> Clone for Bucket<V> {
    fn clone(&self) -> Self {
        match self {
            Bucket::Empty => Bucket::Empty,
            Bucket::Leaf { key, value } => Bucket::Leaf {
                key: key.clone(),
                value: value.clone(),
            },
            Bucket::Nested(table) => Bucket::Nested(table.clone()),
        }
    }
}

/// Copy `key` into an owned, exactly-sized heap block.
fn copy_key(key: &[u8]) -> Result<Box<[u8]>> {
    let mut owned = Vec::new();
    owned
        .try_reserve_exact(key.len())
        .map_err(|e| Error::alloc::<u8>(key.len(), e))?;
    owned.extend_from_slice(key);
    Ok(owned.into_boxed_slice())
}

pub(crate) struct Table<V> {
    buckets: Box<[Bucket<V>]>,
}

impl<V: Clone> Clone for Table<V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
        }
    }
}

impl<V> Table<V> {
    /// Allocate a table of empty buckets.
    pub(crate) fn try_new() -> Result<Self> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(BUCKETS_PER_TABLE)
            .map_err(|e| Error::alloc::<Bucket<V>>(BUCKETS_PER_TABLE, e))?;
        buckets.extend((0..BUCKETS_PER_TABLE).map(|_| Bucket::Empty));
        Ok(Self {
            buckets: buckets.into_boxed_slice(),
        })
    }

    #[inline]
    pub(crate) fn buckets(&self) -> &[Bucket<V>] {
        &self.buckets
    }

    /// Bytes owned directly by this table's bucket array.
    #[inline]
    pub(crate) fn allocation_size(&self) -> usize {
        self.buckets.len() * mem::size_of::<Bucket<V>>()
    }

    /// Number of non-empty buckets at this level only.
    pub(crate) fn entries(&self) -> usize {
        self.buckets.iter().filter(|b| !b.is_empty()).count()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    pub(crate) fn get(&self, key: &[u8], round: usize) -> Option<&V> {
        match &self.buckets[bucket_index(key, round)] {
            Bucket::Empty => None,
            Bucket::Nested(child) => child.get(key, round + 1),
            Bucket::Leaf { key: stored, value } => (stored[..] == *key).then_some(value),
        }
    }

    pub(crate) fn get_mut(&mut self, key: &[u8], round: usize) -> Option<&mut V> {
        match &mut self.buckets[bucket_index(key, round)] {
            Bucket::Empty => None,
            Bucket::Nested(child) => child.get_mut(key, round + 1),
            Bucket::Leaf { key: stored, value } => (stored[..] == *key).then_some(value),
        }
    }

    /// Insert or update `key` in this table at nesting level `round`.
    ///
    /// On error the table is unchanged and `value` is handed back.
    pub(crate) fn set(&mut self, key: &[u8], value: V, round: usize) -> SetResult<V> {
        let idx = bucket_index(key, round);
        let bucket = &mut self.buckets[idx];

        match mem::replace(bucket, Bucket::Empty) {
            Bucket::Empty => match copy_key(key) {
                Ok(key) => {
                    *bucket = Bucket::Leaf { key, value };
                    Ok(SetOutcome::Inserted)
                }
                Err(error) => Err(SetError { error, value }),
            },
            Bucket::Nested(mut child) => {
                let outcome = child.set(key, value, round + 1);
                *bucket = Bucket::Nested(child);
                outcome
            }
            Bucket::Leaf {
                key: stored,
                value: old,
            } if stored[..] == *key => {
                *bucket = Bucket::Leaf { key: stored, value };
                Ok(SetOutcome::Updated(old))
            }
            Bucket::Leaf {
                key: stored,
                value: old,
            } => match Self::split(stored, old, key, value, round + 1) {
                Ok((child, outcome)) => {
                    log::trace!("bucket {idx} at round {round} split into a nested table");
                    *bucket = Bucket::Nested(child);
                    Ok(outcome)
                }
                Err((stored, old, err)) => {
                    *bucket = Bucket::Leaf { key: stored, value: old };
                    Err(err)
                }
            },
        }
    }

    /// Build the nested table that replaces a colliding leaf.
    ///
    /// The displaced leaf is placed first; it cannot collide in an empty
    /// table. The incoming key may collide with it again, in which case
    /// `set` splits once more one level further down. On failure the
    /// displaced leaf is handed back so the caller can restore it.
    #[allow(clippy::type_complexity)]
    fn split(
        stored: Box<[u8]>,
        old: V,
        key: &[u8],
        value: V,
        round: usize,
    ) -> std::result::Result<(Self, SetOutcome<V>), (Box<[u8]>, V, SetError<V>)> {
        let mut child = match Self::try_new() {
            Ok(child) => child,
            Err(error) => return Err((stored, old, SetError { error, value })),
        };

        let old_idx = bucket_index(&stored, round);
        child.buckets[old_idx] = Bucket::Leaf {
            key: stored,
            value: old,
        };

        match child.set(key, value, round) {
            Ok(outcome) => Ok((child, outcome)),
            Err(err) => match mem::replace(&mut child.buckets[old_idx], Bucket::Empty) {
                Bucket::Leaf { key, value } => Err((key, value, err)),
                // A failed `set` never touches the displaced leaf.
                _ => unreachable!("displaced leaf moved during failed insertion"),
            },
        }
    }

    /// Remove `key` from this table at nesting level `round`.
    ///
    /// Nested tables left empty by the removal are dropped here. The caller
    /// is responsible for dropping `self` if [`Table::is_empty`] now holds.
    pub(crate) fn clear(&mut self, key: &[u8], round: usize) -> Option<V> {
        let idx = bucket_index(key, round);
        let bucket = &mut self.buckets[idx];

        match bucket {
            Bucket::Empty => None,
            Bucket::Nested(child) => {
                let removed = child.clear(key, round + 1)?;
                if child.is_empty() {
                    log::trace!("nested table under bucket {idx} at round {round} collapsed");
                    *bucket = Bucket::Empty;
                }
                Some(removed)
            }
            Bucket::Leaf { key: stored, .. } => {
                if stored[..] != *key {
                    return None;
                }
                mem::replace(bucket, Bucket::Empty).into_value()
            }
        }
    }
}
