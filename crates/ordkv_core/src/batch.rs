//! Atomic write batches with a single-use lifecycle.

use ordkv_provider::{Provider, ProviderBatch};
use std::sync::Arc;

use crate::error::{check_key, StoreError, StoreResult};

/// A buffered set of put/delete operations applied atomically.
///
/// Created by [`KvStore::new_batch`]. Operations are queued locally
/// and stay invisible to readers until [`write`] (or [`write_sync`])
/// commits them all at once.
///
/// # Lifecycle
///
/// A batch is **open** until the first successful `write`,
/// `write_sync`, or `close`, and **closed** forever after. Batches are
/// strictly single-use: any `set`, `delete`, or `write` on a closed
/// batch fails with [`StoreError::BatchClosed`]. `close` itself is an
/// idempotent no-op once the batch is closed.
///
/// [`KvStore::new_batch`]: crate::KvStore::new_batch
/// [`write`]: Batch::write
/// [`write_sync`]: Batch::write_sync
pub struct Batch {
    provider: Arc<dyn Provider>,
    /// `None` once the batch has been written or closed.
    inner: Option<Box<dyn ProviderBatch>>,
}

impl Batch {
    pub(crate) fn new(provider: Arc<dyn Provider>, inner: Box<dyn ProviderBatch>) -> Self {
        Self {
            provider,
            inner: Some(inner),
        }
    }

    /// Queues a put operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyKey`] for a zero-length key and
    /// [`StoreError::BatchClosed`] if the batch has been written or
    /// closed.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        let inner = self.inner.as_mut().ok_or(StoreError::BatchClosed)?;
        inner.put(key, value)?;
        Ok(())
    }

    /// Queues a delete operation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyKey`] for a zero-length key and
    /// [`StoreError::BatchClosed`] if the batch has been written or
    /// closed.
    pub fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        let inner = self.inner.as_mut().ok_or(StoreError::BatchClosed)?;
        inner.delete(key)?;
        Ok(())
    }

    /// Commits every queued operation atomically, then closes the
    /// batch.
    ///
    /// On a commit error the batch stays open and nothing becomes
    /// visible to readers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BatchClosed`] if already closed, or the
    /// provider's commit error.
    pub fn write(&mut self) -> StoreResult<()> {
        let inner = self.inner.as_mut().ok_or(StoreError::BatchClosed)?;
        tracing::debug!(ops = inner.len(), "committing batch");
        inner.commit()?;
        self.inner = None;
        Ok(())
    }

    /// Commits like [`write`], then requests a provider durability
    /// sync before closing.
    ///
    /// # Errors
    ///
    /// As [`write`], plus any sync failure (which also leaves the
    /// batch open).
    ///
    /// [`write`]: Batch::write
    pub fn write_sync(&mut self) -> StoreResult<()> {
        let inner = self.inner.as_mut().ok_or(StoreError::BatchClosed)?;
        tracing::debug!(ops = inner.len(), "committing batch with sync");
        inner.commit()?;
        self.provider.sync()?;
        self.inner = None;
        Ok(())
    }

    /// Discards any queued operations and closes the batch.
    ///
    /// Safe to call multiple times.
    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Returns whether the batch has been written or closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
