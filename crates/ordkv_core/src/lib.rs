//! # ordkv Core
//!
//! A uniform key-value store facade over ordered storage providers.
//!
//! This crate adapts any [`ordkv_provider::Provider`] to one fixed,
//! narrow contract:
//! - Point operations: get / has / set / delete, with `_sync` variants
//!   that request a durability barrier
//! - Atomic batches: buffered writes committed all-or-nothing, with a
//!   strict single-use lifecycle
//! - Range iteration: forward and reverse cursors over half-open key
//!   ranges, with a latched validity state machine
//!
//! ## Contract highlights
//!
//! - Empty keys (and explicitly empty range bounds) are validation
//!   errors, rejected before the provider is touched
//! - A missing key reads as `Ok(None)`; zero-length values are legal
//!   and distinct from absence
//! - An iterator that goes invalid stays invalid; reading it anyway is
//!   a caller bug and panics
//! - A batch is consumed by its first write or close; reuse fails with
//!   [`StoreError::BatchClosed`]
//!
//! ## Example
//!
//! ```rust
//! use ordkv_core::KvStore;
//! use ordkv_provider::MemoryProvider;
//! use std::sync::Arc;
//!
//! let store = KvStore::new(Arc::new(MemoryProvider::new()));
//!
//! let mut batch = store.new_batch();
//! batch.set(b"a", b"1").unwrap();
//! batch.set(b"b", b"2").unwrap();
//! batch.write().unwrap();
//!
//! let mut iter = store.iterator(None, None).unwrap();
//! while iter.valid() {
//!     println!("{:?} = {:?}", iter.key(), iter.value());
//!     iter.next();
//! }
//! iter.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod error;
mod iterator;
mod store;

pub use batch::Batch;
pub use error::{StoreError, StoreResult};
pub use iterator::StoreIterator;
pub use store::KvStore;
