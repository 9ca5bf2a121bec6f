//! File-backed provider: an append-only log replayed into an ordered
//! in-memory index.
//!
//! Directory layout:
//!
//! ```text
//! <dir>/
//! ├─ LOCK        # Advisory lock for single-writer
//! └─ data.log    # Append-only put/delete records
//! ```
//!
//! Every mutation appends a record to `data.log`; the full key-value
//! state is rebuilt by replaying the log at open. A truncated trailing
//! record (torn write) is treated as the end of the log.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    collect_range, Batching, Order, PendingOp, PersistentDiagnostics, Provider, ProviderBatch,
    RangeQuery, SnapshotQuery,
};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "data.log";

/// Record tags in the log.
const TAG_PUT: u8 = 1;
const TAG_DELETE: u8 = 2;

/// tag (1) + key_len (4) + val_len (4)
const HEADER_SIZE: usize = 9;

/// Options for opening a [`FileProvider`].
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to open read-only.
    ///
    /// Read-only opens skip the advisory lock, so any number of them
    /// can coexist with one writer. All mutations fail with
    /// [`ProviderError::ReadOnly`].
    pub read_only: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            read_only: false,
        }
    }
}

impl FileOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to open read-only.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }
}

/// A persistent ordered key-value provider.
///
/// State lives in an append-only record log; an in-memory `BTreeMap`
/// index is rebuilt from it at open and kept current on every write.
/// Range queries are served from the index, so they come out in
/// bytewise key order.
///
/// # Capabilities
///
/// Supports atomic batching and disk-usage reporting.
///
/// # Locking
///
/// A writable open takes an exclusive advisory lock on the `LOCK`
/// file; a second writable open of the same directory fails with
/// [`ProviderError::Locked`]. Read-only opens do not take the lock.
///
/// # Example
///
/// ```no_run
/// use ordkv_provider::{FileProvider, Provider};
/// use std::path::Path;
///
/// let provider = FileProvider::open(Path::new("my_store")).unwrap();
/// provider.put(b"key", b"value").unwrap();
/// provider.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileProvider {
    dir: PathBuf,
    read_only: bool,
    inner: Arc<RwLock<FileInner>>,
}

#[derive(Debug)]
struct FileInner {
    index: BTreeMap<Vec<u8>, Vec<u8>>,
    log: File,
    /// Held for the provider's lifetime; dropped on close.
    lock_file: Option<File>,
    closed: bool,
}

impl FileInner {
    fn guard(&self) -> ProviderResult<()> {
        if self.closed {
            return Err(ProviderError::Closed);
        }
        Ok(())
    }

    /// Appends encoded records, then applies the ops to the index.
    ///
    /// The index is only touched after the log write succeeds, so a
    /// failed append leaves nothing visible to readers.
    fn append_and_apply(&mut self, ops: &[PendingOp]) -> ProviderResult<()> {
        let mut buf = Vec::new();
        for op in ops {
            encode_record(&mut buf, op);
        }
        self.log.write_all(&buf)?;

        for op in ops {
            match op {
                PendingOp::Put { key, value } => {
                    self.index.insert(key.clone(), value.clone());
                }
                PendingOp::Delete { key } => {
                    self.index.remove(key);
                }
            }
        }
        Ok(())
    }
}

impl FileProvider {
    /// Opens or creates a store at `dir` with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or opened,
    /// the advisory lock is held by another process (`Locked`), or the
    /// log fails to replay.
    pub fn open(dir: &Path) -> ProviderResult<Self> {
        Self::open_with(dir, FileOptions::default())
    }

    /// Opens a store at `dir` with the given options.
    ///
    /// # Errors
    ///
    /// As [`FileProvider::open`]; additionally, a read-only open of a
    /// store that doesn't exist fails with an I/O error.
    pub fn open_with(dir: &Path, options: FileOptions) -> ProviderResult<Self> {
        if !dir.exists() {
            if options.read_only || !options.create_if_missing {
                return Err(ProviderError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("store directory does not exist: {}", dir.display()),
                )));
            }
            fs::create_dir_all(dir)?;
        }

        let lock_file = if options.read_only {
            None
        } else {
            let lock = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(dir.join(LOCK_FILE))?;
            if lock.try_lock_exclusive().is_err() {
                return Err(ProviderError::Locked);
            }
            Some(lock)
        };

        let log = OpenOptions::new()
            .read(true)
            .write(!options.read_only)
            .create(!options.read_only)
            .truncate(false)
            .open(dir.join(LOG_FILE))?;

        let index = replay(&log)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            read_only: options.read_only,
            inner: Arc::new(RwLock::new(FileInner {
                index,
                log,
                lock_file,
                closed: false,
            })),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns whether this handle was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn check_writable(&self) -> ProviderResult<()> {
        if self.read_only {
            return Err(ProviderError::ReadOnly);
        }
        Ok(())
    }
}

impl Provider for FileProvider {
    fn get(&self, key: &[u8]) -> ProviderResult<Vec<u8>> {
        let inner = self.inner.read();
        inner.guard()?;
        inner.index.get(key).cloned().ok_or(ProviderError::NotFound)
    }

    fn has(&self, key: &[u8]) -> ProviderResult<bool> {
        let inner = self.inner.read();
        inner.guard()?;
        Ok(inner.index.contains_key(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> ProviderResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        inner.guard()?;
        inner.append_and_apply(&[PendingOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }])
    }

    fn delete(&self, key: &[u8]) -> ProviderResult<()> {
        self.check_writable()?;
        let mut inner = self.inner.write();
        inner.guard()?;
        // Skip the log record when there is nothing to remove.
        if !inner.index.contains_key(key) {
            return Ok(());
        }
        inner.append_and_apply(&[PendingOp::Delete { key: key.to_vec() }])
    }

    fn sync(&self) -> ProviderResult<()> {
        if self.read_only {
            return Ok(());
        }
        let mut inner = self.inner.write();
        inner.guard()?;
        inner.log.flush()?;
        inner.log.sync_all()?;
        Ok(())
    }

    fn range_query(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> ProviderResult<Box<dyn RangeQuery>> {
        let inner = self.inner.read();
        inner.guard()?;
        let entries = collect_range(&inner.index, start, end, order);
        Ok(Box::new(SnapshotQuery::new(entries)))
    }

    fn close(&self) -> ProviderResult<()> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Ok(());
        }
        if !self.read_only {
            inner.log.flush()?;
            inner.log.sync_all()?;
        }
        inner.lock_file = None;
        inner.closed = true;
        Ok(())
    }

    fn batching(&self) -> Option<&dyn Batching> {
        Some(self)
    }

    fn diagnostics(&self) -> Option<&dyn PersistentDiagnostics> {
        Some(self)
    }
}

impl Batching for FileProvider {
    fn batch(&self) -> ProviderResult<Box<dyn ProviderBatch>> {
        self.check_writable()?;
        self.inner.read().guard()?;
        Ok(Box::new(FileBatch {
            inner: Arc::clone(&self.inner),
            ops: Vec::new(),
        }))
    }
}

impl PersistentDiagnostics for FileProvider {
    fn disk_usage(&self) -> ProviderResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            total += entry?.metadata()?.len();
        }
        Ok(total)
    }
}

/// A buffered batch against a [`FileProvider`].
///
/// Commit encodes all buffered records into one buffer, appends it with
/// a single write under the write lock, then updates the index, so
/// readers see all of the batch or none of it.
#[derive(Debug)]
struct FileBatch {
    inner: Arc<RwLock<FileInner>>,
    ops: Vec<PendingOp>,
}

impl ProviderBatch for FileBatch {
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
        inner.append_and_apply(&self.ops)?;
        self.ops.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Encodes one record:
/// `tag (1) | key_len (u32 LE) | val_len (u32 LE) | key | value`.
fn encode_record(buf: &mut Vec<u8>, op: &PendingOp) {
    match op {
        PendingOp::Put { key, value } => {
            buf.push(TAG_PUT);
            buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
            buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
            buf.extend_from_slice(key);
            buf.extend_from_slice(value);
        }
        PendingOp::Delete { key } => {
            buf.push(TAG_DELETE);
            buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes());
            buf.extend_from_slice(key);
        }
    }
}

/// Replays the log into a fresh index.
///
/// A truncated trailing record is treated as the end of the log; an
/// unknown tag is corruption.
fn replay(log: &File) -> ProviderResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut data = Vec::new();
    let mut reader = log;
    reader.read_to_end(&mut data)?;

    let mut index = BTreeMap::new();
    let mut pos = 0;
    while pos + HEADER_SIZE <= data.len() {
        let tag = data[pos];
        let key_len = u32::from_le_bytes(data[pos + 1..pos + 5].try_into().unwrap()) as usize;
        let val_len = u32::from_le_bytes(data[pos + 5..pos + 9].try_into().unwrap()) as usize;
        let body_start = pos + HEADER_SIZE;

        let Some(body_end) = key_len
            .checked_add(val_len)
            .and_then(|body| body_start.checked_add(body))
        else {
            break;
        };
        if body_end > data.len() {
            // Torn trailing record.
            break;
        }

        let key = data[body_start..body_start + key_len].to_vec();
        match tag {
            TAG_PUT => {
                let value = data[body_start + key_len..body_end].to_vec();
                index.insert(key, value);
            }
            TAG_DELETE => {
                index.remove(&key);
            }
            other => {
                return Err(ProviderError::corrupted(format!(
                    "unknown record tag {other} at offset {pos}"
                )));
            }
        }
        pos = body_end;
    }

    Ok(index)
}
