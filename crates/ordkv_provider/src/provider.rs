//! Provider trait definitions.

use crate::error::ProviderResult;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Ordering directive for a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Strictly ascending key order.
    Ascending,
    /// Strictly descending key order.
    Descending,
}

/// An immutable key-value pair returned by reads and range queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The entry key. Never empty.
    pub key: Vec<u8>,
    /// The entry value. May be zero-length.
    pub value: Vec<u8>,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// An ordered key-value storage provider.
///
/// This is the narrow interface the ordkv facade depends on. Providers
/// are **ordered byte stores**: keys sort bytewise, and a range query
/// visits the half-open interval `[start, end)` in the requested order.
///
/// # Invariants
///
/// - `get` on an absent key returns [`ProviderError::NotFound`]
/// - `delete` on an absent key succeeds
/// - `range_query` results are a snapshot; later writes do not appear
///   in an already-open cursor
/// - Providers must be `Send + Sync` for shared access
///
/// # Capabilities
///
/// Atomic batching and disk-usage reporting are optional. Callers probe
/// them through [`Provider::batching`] and [`Provider::diagnostics`]
/// and must cope with `None`.
///
/// [`ProviderError::NotFound`]: crate::ProviderError::NotFound
pub trait Provider: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent, or any underlying
    /// storage failure.
    fn get(&self, key: &[u8]) -> ProviderResult<Vec<u8>>;

    /// Returns whether `key` is present.
    ///
    /// # Errors
    ///
    /// Returns an error on underlying storage failure.
    fn has(&self, key: &[u8]) -> ProviderResult<bool>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error on underlying storage failure.
    fn put(&self, key: &[u8], value: &[u8]) -> ProviderResult<()>;

    /// Removes `key` if present. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on underlying storage failure.
    fn delete(&self, key: &[u8]) -> ProviderResult<()>;

    /// Durability barrier: all previously acknowledged writes survive
    /// process termination after this returns.
    ///
    /// Providers without a durability story return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the barrier cannot be established.
    fn sync(&self) -> ProviderResult<()>;

    /// Issues an ordered scan over the half-open interval `[start, end)`.
    ///
    /// `None` bounds are unbounded on that side. The returned cursor is
    /// a snapshot taken at call time.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be issued.
    fn range_query(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> ProviderResult<Box<dyn RangeQuery>>;

    /// Releases the provider's resources.
    ///
    /// Whether a second close is an error is provider-defined.
    ///
    /// # Errors
    ///
    /// Returns an error if resources cannot be released.
    fn close(&self) -> ProviderResult<()>;

    /// Atomic-batching capability, if this provider supports it.
    fn batching(&self) -> Option<&dyn Batching>;

    /// Disk-usage reporting capability, if this provider supports it.
    fn diagnostics(&self) -> Option<&dyn PersistentDiagnostics>;
}

/// A cursor over the results of a range query.
///
/// Exhaustion is signalled by `None`; per-entry failures are surfaced
/// as `Some(Err(..))`. The cursor holds provider resources until
/// [`RangeQuery::close`] is called (or the cursor is dropped).
pub trait RangeQuery: Send {
    /// Pulls the next entry in the configured order.
    ///
    /// Returns `None` once the range is exhausted or the cursor has
    /// been closed.
    fn next_entry(&mut self) -> Option<ProviderResult<Entry>>;

    /// Releases the cursor's resources. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if resources cannot be released.
    fn close(&mut self) -> ProviderResult<()>;
}

/// Atomic-batching capability.
pub trait Batching {
    /// Opens a new provider batch.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch cannot be opened (for example, the
    /// provider is closed or read-only).
    fn batch(&self) -> ProviderResult<Box<dyn ProviderBatch>>;
}

/// A buffered set of writes applied atomically on commit.
///
/// Buffered operations are invisible to readers until [`commit`]
/// returns; commit applies all of them or none.
///
/// [`commit`]: ProviderBatch::commit
pub trait ProviderBatch: Send {
    /// Buffers a put operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be buffered.
    fn put(&mut self, key: &[u8], value: &[u8]) -> ProviderResult<()>;

    /// Buffers a delete operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be buffered.
    fn delete(&mut self, key: &[u8]) -> ProviderResult<()>;

    /// Applies all buffered operations atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; on failure nothing becomes
    /// visible to readers.
    fn commit(&mut self) -> ProviderResult<()>;

    /// Returns the number of buffered operations.
    fn len(&self) -> usize;

    /// Returns whether no operations are buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Disk-usage reporting capability.
pub trait PersistentDiagnostics {
    /// Returns the provider's on-disk footprint in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the footprint cannot be determined.
    fn disk_usage(&self) -> ProviderResult<u64>;
}

/// A pending write buffered by a provider batch.
#[derive(Debug, Clone)]
pub(crate) enum PendingOp {
    /// Insert or replace a key.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove a key.
    Delete { key: Vec<u8> },
}

/// Collects the entries of `map` falling in `[start, end)` in the
/// requested order.
///
/// An impossible interval (start past end) yields no entries rather
/// than an error.
pub(crate) fn collect_range(
    map: &BTreeMap<Vec<u8>, Vec<u8>>,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    order: Order,
) -> Vec<Entry> {
    if let (Some(s), Some(e)) = (start, end) {
        // BTreeMap::range panics on an inverted interval.
        if s > e {
            return Vec::new();
        }
    }

    let lower = match start {
        Some(s) => Bound::Included(s.to_vec()),
        None => Bound::Unbounded,
    };
    let upper = match end {
        Some(e) => Bound::Excluded(e.to_vec()),
        None => Bound::Unbounded,
    };

    let matched = map
        .range::<Vec<u8>, _>((lower, upper))
        .map(|(k, v)| Entry::new(k.clone(), v.clone()));

    match order {
        Order::Ascending => matched.collect(),
        Order::Descending => {
            let mut entries: Vec<_> = matched.collect();
            entries.reverse();
            entries
        }
    }
}

/// A range-query cursor over a snapshot of entries.
///
/// Both built-in providers serve range queries from an in-memory
/// ordered index, so they share this cursor: the matching entries are
/// collected at query time and handed out one by one.
#[derive(Debug)]
pub struct SnapshotQuery {
    entries: std::vec::IntoIter<Entry>,
    closed: bool,
}

impl SnapshotQuery {
    /// Creates a cursor over pre-collected entries.
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into_iter(),
            closed: false,
        }
    }
}

impl RangeQuery for SnapshotQuery {
    fn next_entry(&mut self) -> Option<ProviderResult<Entry>> {
        if self.closed {
            return None;
        }
        self.entries.next().map(Ok)
    }

    fn close(&mut self) -> ProviderResult<()> {
        self.closed = true;
        Ok(())
    }
}
