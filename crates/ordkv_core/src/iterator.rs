//! Range iterator with a latched validity state machine.

use ordkv_provider::{Entry, Order, ProviderError, RangeQuery};

use crate::error::StoreResult;

/// A single-direction cursor over a half-open key range.
///
/// Constructed by [`KvStore::iterator`] and [`KvStore::reverse_iterator`];
/// the cursor is primed onto the first matching entry at construction,
/// so an iterator over an empty or impossible range is already invalid
/// when it is handed to the caller.
///
/// # State machine
///
/// The cursor is either **valid** (positioned on an entry) or
/// **invalid**. Invalid is terminal and latched: once the range is
/// exhausted or an error is observed, [`valid`] returns `false` forever,
/// even if the underlying condition would have cleared.
///
/// # Panics
///
/// [`key`], [`value`], and [`next`] on an invalid iterator are caller
/// bugs and panic rather than returning an error; check [`valid`]
/// first. The usual shape:
///
/// ```rust
/// # use ordkv_core::KvStore;
/// # use ordkv_provider::MemoryProvider;
/// # use std::sync::Arc;
/// # let store = KvStore::new(Arc::new(MemoryProvider::new()));
/// # store.set(b"k", b"v").unwrap();
/// let mut iter = store.iterator(None, None).unwrap();
/// while iter.valid() {
///     let _ = (iter.key(), iter.value());
///     iter.next();
/// }
/// iter.close().unwrap();
/// ```
///
/// # Resources
///
/// The iterator owns its provider range query until [`close`] is
/// called (dropping the iterator also releases it).
///
/// [`KvStore::iterator`]: crate::KvStore::iterator
/// [`KvStore::reverse_iterator`]: crate::KvStore::reverse_iterator
/// [`valid`]: StoreIterator::valid
/// [`key`]: StoreIterator::key
/// [`value`]: StoreIterator::value
/// [`next`]: StoreIterator::next
/// [`close`]: StoreIterator::close
pub struct StoreIterator {
    query: Box<dyn RangeQuery>,
    current: Option<Entry>,
    last_error: Option<ProviderError>,
    start: Option<Vec<u8>>,
    end: Option<Vec<u8>>,
    /// Latched terminal flag; never cleared once set.
    invalid: bool,
}

impl StoreIterator {
    pub(crate) fn new(
        query: Box<dyn RangeQuery>,
        start: Option<Vec<u8>>,
        end: Option<Vec<u8>>,
        order: Order,
    ) -> Self {
        tracing::trace!(?order, "opening range iterator");
        let mut iter = Self {
            query,
            current: None,
            last_error: None,
            start,
            end,
            invalid: false,
        };
        // Prime onto the first entry; an empty range latches invalid
        // before the caller ever sees the iterator.
        iter.advance();
        iter
    }

    /// Pulls one entry from the query, latching invalid on exhaustion
    /// or error.
    fn advance(&mut self) {
        match self.query.next_entry() {
            Some(Ok(entry)) => self.current = Some(entry),
            Some(Err(err)) => {
                self.last_error = Some(err);
                self.invalid = true;
            }
            None => self.invalid = true,
        }
    }

    /// Returns whether the cursor is positioned on a usable entry.
    ///
    /// Once this returns `false` it returns `false` forever.
    #[must_use]
    pub fn valid(&self) -> bool {
        !self.invalid
    }

    /// Returns the current entry's key.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        self.assert_valid();
        &self.current.as_ref().expect("valid iterator has an entry").key
    }

    /// Returns the current entry's value.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is invalid.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        self.assert_valid();
        &self
            .current
            .as_ref()
            .expect("valid iterator has an entry")
            .value
    }

    /// Advances to the next entry in the configured direction.
    ///
    /// # Panics
    ///
    /// Panics if the iterator is already invalid.
    pub fn next(&mut self) {
        self.assert_valid();
        self.advance();
    }

    /// Returns the last error observed on the underlying range query,
    /// without changing the iterator's state.
    #[must_use]
    pub fn error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    /// Returns the originally requested `(start, end)` bounds.
    #[must_use]
    pub fn domain(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        (self.start.as_deref(), self.end.as_deref())
    }

    /// Releases the underlying range-query resource.
    ///
    /// Safe to call in any validity state, more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to release the query.
    pub fn close(&mut self) -> StoreResult<()> {
        self.query.close()?;
        Ok(())
    }

    fn assert_valid(&self) {
        if !self.valid() {
            panic!("iterator is invalid");
        }
    }
}

impl std::fmt::Debug for StoreIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreIterator")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("invalid", &self.invalid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordkv_provider::{ProviderResult, SnapshotQuery};

    fn entry(key: &[u8]) -> Entry {
        Entry::new(key.to_vec(), b"value".to_vec())
    }

    fn iter_over(entries: Vec<Entry>) -> StoreIterator {
        StoreIterator::new(
            Box::new(SnapshotQuery::new(entries)),
            None,
            None,
            Order::Ascending,
        )
    }

    /// A query that yields one entry, then an error.
    struct FailingQuery {
        yielded: bool,
    }

    impl RangeQuery for FailingQuery {
        fn next_entry(&mut self) -> Option<ProviderResult<Entry>> {
            if self.yielded {
                Some(Err(ProviderError::corrupted("bad entry")))
            } else {
                self.yielded = true;
                Some(Ok(entry(b"a")))
            }
        }

        fn close(&mut self) -> ProviderResult<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_range_is_invalid_at_construction() {
        let iter = iter_over(vec![]);
        assert!(!iter.valid());
        assert!(iter.error().is_none());
    }

    #[test]
    fn primed_onto_first_entry() {
        let iter = iter_over(vec![entry(b"a"), entry(b"b")]);
        assert!(iter.valid());
        assert_eq!(iter.key(), b"a");
        assert_eq!(iter.value(), b"value");
    }

    #[test]
    fn exhaustion_latches_invalid() {
        let mut iter = iter_over(vec![entry(b"a")]);
        assert!(iter.valid());
        iter.next();
        assert!(!iter.valid());
        assert!(!iter.valid());
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn next_on_invalid_panics() {
        let mut iter = iter_over(vec![]);
        iter.next();
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn key_on_invalid_panics() {
        let iter = iter_over(vec![]);
        let _ = iter.key();
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn value_on_invalid_panics() {
        let iter = iter_over(vec![]);
        let _ = iter.value();
    }

    #[test]
    fn query_error_latches_invalid_and_is_reported() {
        let mut iter = StoreIterator::new(
            Box::new(FailingQuery { yielded: false }),
            None,
            None,
            Order::Ascending,
        );
        assert!(iter.valid());
        assert_eq!(iter.key(), b"a");

        iter.next();
        assert!(!iter.valid());
        assert!(matches!(iter.error(), Some(ProviderError::Corrupted(_))));
        // error() does not mutate state.
        assert!(!iter.valid());
        assert!(iter.error().is_some());
    }

    #[test]
    fn domain_returns_requested_bounds() {
        let iter = StoreIterator::new(
            Box::new(SnapshotQuery::new(vec![])),
            Some(b"a".to_vec()),
            Some(b"z".to_vec()),
            Order::Descending,
        );
        let (start, end) = iter.domain();
        assert_eq!(start, Some(b"a".as_slice()));
        assert_eq!(end, Some(b"z".as_slice()));
    }

    #[test]
    fn close_is_safe_in_any_state() {
        let mut iter = iter_over(vec![entry(b"a")]);
        iter.close().unwrap();
        iter.close().unwrap();

        let mut invalid = iter_over(vec![]);
        assert!(!invalid.valid());
        invalid.close().unwrap();
    }
}
