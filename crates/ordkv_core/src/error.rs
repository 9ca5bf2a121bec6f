//! Error types for the store facade.

use ordkv_provider::ProviderError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur on facade operations.
///
/// Validation errors are raised before the provider is touched; a
/// provider failure is never reported alongside one. Caller bugs
/// (reading an invalid iterator, requesting a batch from a provider
/// without the batching capability) are panics, not variants here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An empty key or an explicitly empty range bound was supplied.
    #[error("key cannot be empty")]
    EmptyKey,

    /// The batch has already been written or closed.
    #[error("batch has been written or closed")]
    BatchClosed,

    /// Passthrough of an underlying provider failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Validates a key: every key-taking operation rejects zero length.
pub(crate) fn check_key(key: &[u8]) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(())
}

/// Validates a range bound: `None` is unbounded, but an explicitly
/// supplied empty bound is an error, never "unbounded".
pub(crate) fn check_bound(bound: Option<&[u8]>) -> StoreResult<()> {
    match bound {
        Some(b) if b.is_empty() => Err(StoreError::EmptyKey),
        _ => Ok(()),
    }
}
