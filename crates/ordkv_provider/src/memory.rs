//! In-memory provider for testing and ephemeral stores.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    collect_range, Batching, Order, PendingOp, PersistentDiagnostics, Provider, ProviderBatch,
    RangeQuery, SnapshotQuery,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An in-memory ordered key-value provider.
///
/// Keys are held in a `BTreeMap`, so range queries come out in bytewise
/// key order for free. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Capabilities
///
/// Supports atomic batching. Does not report disk usage (there is no
/// disk).
///
/// # Thread Safety
///
/// Thread-safe; all access goes through an internal `RwLock`.
///
/// # Example
///
/// ```rust
/// use ordkv_provider::{MemoryProvider, Provider};
///
/// let provider = MemoryProvider::new();
/// provider.put(b"key", b"value").unwrap();
/// assert_eq!(provider.get(b"key").unwrap(), b"value");
/// ```
#[derive(Debug, Default)]
pub struct MemoryProvider {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
    closed: bool,
}

impl MemoryInner {
    fn guard(&self) -> ProviderResult<()> {
        if self.closed {
            return Err(ProviderError::Closed);
        }
        Ok(())
    }

    fn apply(&mut self, ops: &[PendingOp]) {
        for op in ops {
            match op {
                PendingOp::Put { key, value } => {
                    self.map.insert(key.clone(), value.clone());
                }
                PendingOp::Delete { key } => {
                    self.map.remove(key);
                }
            }
        }
    }
}

impl MemoryProvider {
    /// Creates a new empty in-memory provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    ///
    /// Useful for tests and debugging.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// Returns whether the provider holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Provider for MemoryProvider {
    fn get(&self, key: &[u8]) -> ProviderResult<Vec<u8>> {
        let inner = self.inner.read();
        inner.guard()?;
        inner.map.get(key).cloned().ok_or(ProviderError::NotFound)
    }

    fn has(&self, key: &[u8]) -> ProviderResult<bool> {
        let inner = self.inner.read();
        inner.guard()?;
        Ok(inner.map.contains_key(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        inner.guard()?;
        inner.map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        inner.guard()?;
        inner.map.remove(key);
        Ok(())
    }

    fn sync(&self) -> ProviderResult<()> {
        // Nothing to make durable.
        self.inner.read().guard()
    }

    fn range_query(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> ProviderResult<Box<dyn RangeQuery>> {
        let inner = self.inner.read();
        inner.guard()?;
        let entries = collect_range(&inner.map, start, end, order);
        Ok(Box::new(SnapshotQuery::new(entries)))
    }

    fn close(&self) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        inner.closed = true;
        inner.map.clear();
        Ok(())
    }

    fn batching(&self) -> Option<&dyn Batching> {
        Some(self)
    }

    fn diagnostics(&self) -> Option<&dyn PersistentDiagnostics> {
        None
    }
}

impl Batching for MemoryProvider {
    fn batch(&self) -> ProviderResult<Box<dyn ProviderBatch>> {
        self.inner.read().guard()?;
        Ok(Box::new(MemoryBatch {
            inner: Arc::clone(&self.inner),
            ops: Vec::new(),
        }))
    }
}

/// A buffered batch against a [`MemoryProvider`].
///
/// Commit takes the write lock once and applies every buffered
/// operation under it, so readers see all of the batch or none of it.
#[derive(Debug)]
struct MemoryBatch {
    inner: Arc<RwLock<MemoryInner>>,
    ops: Vec<PendingOp>,
}

impl ProviderBatch for MemoryBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) -> ProviderResult<()> {
        self.ops.push(PendingOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> ProviderResult<()> {
        self.ops.push(PendingOp::Delete { key: key.to_vec() });
        Ok(())
    }

    fn commit(&mut self) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        inner.guard()?;
        inner.apply(&self.ops);
        self.ops.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.ops.len()
    }
}
