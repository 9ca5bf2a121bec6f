//! Error types for provider operations.

use std::io;
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested key does not exist.
    ///
    /// Callers that want "absent is not an error" semantics translate
    /// this variant; the provider itself reports it faithfully.
    #[error("key not found")]
    NotFound,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk log is corrupted.
    #[error("log corrupted: {0}")]
    Corrupted(String),

    /// The provider has been closed.
    #[error("provider is closed")]
    Closed,

    /// Another process holds the advisory lock.
    #[error("store locked: another process has exclusive access")]
    Locked,

    /// The provider was opened read-only and refuses mutations.
    #[error("provider is read-only")]
    ReadOnly,
}

impl ProviderError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
