//! The key-value store facade.

use ordkv_provider::{Order, Provider, ProviderError};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::batch::Batch;
use crate::error::{check_bound, check_key, StoreResult};
use crate::iterator::StoreIterator;

/// A uniform facade over an ordered key-value [`Provider`].
///
/// `KvStore` adapts any provider to one narrow contract: point
/// reads/writes, atomic batches, and bidirectional range iteration.
/// It validates inputs before touching the provider, translates the
/// provider's not-found signal into `Ok(None)` on reads, and passes
/// every other provider error through unchanged.
///
/// The facade is long-lived: create it once over a provider, share
/// references as needed, and [`close`] it at shutdown.
///
/// # Example
///
/// ```rust
/// use ordkv_core::KvStore;
/// use ordkv_provider::MemoryProvider;
/// use std::sync::Arc;
///
/// let store = KvStore::new(Arc::new(MemoryProvider::new()));
/// store.set(b"name", b"ada").unwrap();
/// assert_eq!(store.get(b"name").unwrap(), Some(b"ada".to_vec()));
/// assert_eq!(store.get(b"missing").unwrap(), None);
/// ```
///
/// [`close`]: KvStore::close
pub struct KvStore {
    provider: Arc<dyn Provider>,
    /// Probed once at construction; `new_batch` treats a missing
    /// capability as a configuration error.
    supports_batching: bool,
}

impl KvStore {
    /// Creates a facade over `provider`.
    ///
    /// Optional capabilities are probed here, once, rather than on
    /// every call.
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        let supports_batching = provider.batching().is_some();
        tracing::debug!(batching = supports_batching, "opening key-value store");
        Self {
            provider,
            supports_batching,
        }
    }

    /// Reads the value stored under `key`.
    ///
    /// An absent key is `Ok(None)`, not an error; a zero-length stored
    /// value comes back as `Some(vec![])`, distinct from absence.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` for a zero-length key, or any provider error
    /// other than not-found, unchanged.
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        match self.provider.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ProviderError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns whether `key` is present.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` for a zero-length key, or the provider's
    /// error.
    pub fn has(&self, key: &[u8]) -> StoreResult<bool> {
        check_key(key)?;
        Ok(self.provider.has(key)?)
    }

    /// Stores `value` under `key`. A zero-length value is allowed.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` for a zero-length key, or the provider's
    /// error.
    pub fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        Ok(self.provider.put(key, value)?)
    }

    /// Stores `value` under `key`, then requests a provider durability
    /// sync. Providers without a durability story treat the sync as a
    /// no-op, so the write still succeeds.
    ///
    /// # Errors
    ///
    /// As [`set`], plus any sync failure.
    ///
    /// [`set`]: KvStore::set
    pub fn set_sync(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.set(key, value)?;
        Ok(self.provider.sync()?)
    }

    /// Removes `key` if present. Removing an absent key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` for a zero-length key, or the provider's
    /// error.
    pub fn delete(&self, key: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        Ok(self.provider.delete(key)?)
    }

    /// Removes `key`, then requests a provider durability sync.
    ///
    /// # Errors
    ///
    /// As [`delete`], plus any sync failure.
    ///
    /// [`delete`]: KvStore::delete
    pub fn delete_sync(&self, key: &[u8]) -> StoreResult<()> {
        self.delete(key)?;
        Ok(self.provider.sync()?)
    }

    /// Opens a new atomic write batch.
    ///
    /// # Panics
    ///
    /// Panics if the provider lacks the atomic-batching capability, or
    /// if the provider fails to open a batch. Pairing this facade with
    /// a batch-less provider is a configuration error, not a runtime
    /// condition to recover from.
    #[must_use]
    pub fn new_batch(&self) -> Batch {
        assert!(
            self.supports_batching,
            "provider does not support atomic batches"
        );
        let batching = self
            .provider
            .batching()
            .expect("batching capability probed at construction");
        match batching.batch() {
            Ok(inner) => Batch::new(Arc::clone(&self.provider), inner),
            Err(err) => panic!("failed to open provider batch: {err}"),
        }
    }

    /// Opens a forward iterator over the half-open range
    /// `[start, end)`, in ascending key order.
    ///
    /// `None` bounds are unbounded. The iterator is primed at
    /// construction: over an empty range it is invalid immediately.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` if a bound is supplied but zero-length
    /// (distinct from `None`), or the provider's error.
    pub fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> StoreResult<StoreIterator> {
        self.range_iterator(start, end, Order::Ascending)
    }

    /// Opens a reverse iterator over the half-open range
    /// `[start, end)`, in descending key order.
    ///
    /// Range membership is identical to [`iterator`]; only the order
    /// differs.
    ///
    /// # Errors
    ///
    /// As [`iterator`].
    ///
    /// [`iterator`]: KvStore::iterator
    pub fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> StoreResult<StoreIterator> {
        self.range_iterator(start, end, Order::Descending)
    }

    fn range_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> StoreResult<StoreIterator> {
        check_bound(start)?;
        check_bound(end)?;
        let query = self.provider.range_query(start, end, order)?;
        Ok(StoreIterator::new(
            query,
            start.map(<[u8]>::to_vec),
            end.map(<[u8]>::to_vec),
            order,
        ))
    }

    /// Returns store statistics as string key-value pairs.
    ///
    /// When the provider reports persistent diagnostics, includes
    /// `store.disk_usage` (bytes). Diagnostics failures are skipped
    /// rather than reported.
    #[must_use]
    pub fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        if let Some(diagnostics) = self.provider.diagnostics() {
            if let Ok(size) = diagnostics.disk_usage() {
                stats.insert("store.disk_usage".to_string(), size.to_string());
            }
        }
        stats
    }

    /// Releases the provider.
    ///
    /// Whether a second close succeeds is provider-defined; the facade
    /// adds no guarantee of its own.
    ///
    /// # Errors
    ///
    /// Returns the provider's close error.
    pub fn close(&self) -> StoreResult<()> {
        tracing::debug!("closing key-value store");
        Ok(self.provider.close()?)
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("supports_batching", &self.supports_batching)
            .finish_non_exhaustive()
    }
}
