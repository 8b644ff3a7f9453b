//! Error types for the `rehash-trie` crate

use std::collections::TryReserveError;

/// Errors returned by fallible [`RehashTrie`](crate::RehashTrie) operations.
///
/// Lookup and removal misses are not errors; they return `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A heap block needed by an insertion could not be allocated.
    ///
    /// Either the owned copy of the key or the bucket array of a new nested
    /// table. The map is left exactly as it was before the call.
    #[error("failed to allocate {bytes} bytes while inserting a key")]
    AllocationFailed {
        /// Size of the allocation that failed.
        bytes: usize,
    },
}

impl Error {
    pub(crate) fn alloc<T>(count: usize, cause: TryReserveError) -> Self {
        let bytes = count.saturating_mul(std::mem::size_of::<T>());
        log::debug!("allocation of {bytes} bytes failed: {cause}");
        Error::AllocationFailed { bytes }
    }
}

/// Shorthand for results whose error type is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A failed [`RehashTrie::set`](crate::RehashTrie::set).
///
/// Carries the value that could not be stored so the caller keeps ownership
/// of it and can retry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct SetError<V> {
    /// Why the insertion failed.
    pub error: Error,
    /// The value passed to `set`, untouched.
    pub value: V,
}

impl<V> SetError<V> {
    /// Give back the value that was not stored.
    pub fn into_value(self) -> V {
        self.value
    }
}
