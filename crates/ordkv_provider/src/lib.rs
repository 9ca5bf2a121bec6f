//! # ordkv Provider
//!
//! Ordered key-value provider trait and implementations for ordkv.
//!
//! This crate defines the narrow interface the ordkv facade consumes:
//! point reads and writes, a durability barrier, and an ordered range
//! query over a half-open key interval. Extended behaviors (atomic
//! batching, disk-usage reporting) are **capabilities** a provider may
//! or may not implement, probed dynamically via optional trait
//! references.
//!
//! ## Design Principles
//!
//! - Providers are ordered byte-keyed stores; keys sort bytewise
//! - Capabilities are opt-in, never assumed by callers
//! - Range queries are snapshots: writes after the query is issued do
//!   not perturb an open cursor
//! - Providers must be `Send + Sync`; internal locking is theirs
//!
//! ## Available Providers
//!
//! - [`MemoryProvider`] - For testing and ephemeral stores
//! - [`FileProvider`] - Append-only log with an in-memory index
//!
//! ## Example
//!
//! ```rust
//! use ordkv_provider::{MemoryProvider, Order, Provider};
//!
//! let provider = MemoryProvider::new();
//! provider.put(b"a", b"1").unwrap();
//! let mut query = provider.range_query(None, None, Order::Ascending).unwrap();
//! let entry = query.next_entry().unwrap().unwrap();
//! assert_eq!(entry.key, b"a");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod provider;

pub use error::{ProviderError, ProviderResult};
pub use file::{FileOptions, FileProvider};
pub use memory::MemoryProvider;
pub use provider::{
    Batching, Entry, Order, PersistentDiagnostics, Provider, ProviderBatch, RangeQuery,
    SnapshotQuery,
};
