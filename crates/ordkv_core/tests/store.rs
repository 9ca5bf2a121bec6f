//! Integration tests driving the facade over both built-in providers.

use ordkv_core::{KvStore, StoreError, StoreIterator};
use ordkv_provider::{FileOptions, FileProvider, MemoryProvider, ProviderError};
use std::sync::Arc;

fn memory_store() -> KvStore {
    KvStore::new(Arc::new(MemoryProvider::new()))
}

fn file_store(dir: &std::path::Path) -> KvStore {
    KvStore::new(Arc::new(FileProvider::open(dir).unwrap()))
}

/// Drains a valid iterator into (key, value) pairs, closing it.
fn drain(mut iter: StoreIterator) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut entries = Vec::new();
    while iter.valid() {
        entries.push((iter.key().to_vec(), iter.value().to_vec()));
        iter.next();
    }
    iter.close().unwrap();
    entries
}

#[test]
fn iterator_single_key() {
    let store = memory_store();
    store.set_sync(b"1", b"value_1").unwrap();

    let mut iter = store.iterator(None, None).unwrap();
    assert!(iter.valid());
    assert_eq!(iter.key(), b"1");
    assert_eq!(iter.value(), b"value_1");

    iter.next();
    assert!(!iter.valid());
    // Once invalid...
    assert!(!iter.valid());
    assert!(iter.error().is_none());
    iter.close().unwrap();
}

#[test]
#[should_panic(expected = "iterator is invalid")]
fn iterator_next_past_end_panics() {
    let store = memory_store();
    store.set_sync(b"1", b"value_1").unwrap();

    let mut iter = store.iterator(None, None).unwrap();
    iter.next(); // exhausts the single entry
    iter.next(); // caller bug
}

#[test]
fn iterator_two_keys_in_order() {
    let store = memory_store();
    store.set_sync(b"1", b"value_1").unwrap();
    store.set_sync(b"2", b"value_1").unwrap();

    let mut iter = store.iterator(None, None).unwrap();
    assert!(iter.valid());
    assert_eq!(iter.key(), b"1");

    iter.next();
    assert!(iter.valid());
    assert_eq!(iter.key(), b"2");

    iter.next();
    assert!(!iter.valid());
    iter.close().unwrap();
}

#[test]
fn iterator_many_keys_match_direct_gets() {
    let store = memory_store();
    let value = vec![5u8];
    for i in 0..100u8 {
        store.set(&[i], &value).unwrap();
    }

    let entries = drain(store.iterator(None, None).unwrap());
    assert_eq!(entries.len(), 100);

    for (i, (key, value)) in entries.iter().enumerate() {
        assert_eq!(key, &vec![i as u8]);
        let direct = store.get(key).unwrap();
        assert_eq!(direct.as_ref(), Some(value));
    }
}

#[test]
fn iterator_empty_store_is_invalid() {
    let store = memory_store();

    let iter = store.iterator(None, None).unwrap();
    assert!(!iter.valid());

    let iter = store.iterator(Some(b"1"), None).unwrap();
    assert!(!iter.valid());
}

#[test]
fn iterator_begin_after_last_key_is_invalid() {
    let store = memory_store();
    store.set_sync(b"1", b"value_1").unwrap();

    let iter = store.iterator(Some(b"2"), None).unwrap();
    assert!(!iter.valid());
}

#[test]
fn iterator_half_open_bounds() {
    let store = memory_store();
    for k in [b"a", b"b", b"c", b"d"] {
        store.set(k, b"v").unwrap();
    }

    // [b, d): start inclusive, end exclusive.
    let entries = drain(store.iterator(Some(b"b"), Some(b"d")).unwrap());
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![b"b", b"c"]);
}

#[test]
fn reverse_iterator_descends_same_range() {
    let store = memory_store();
    for k in [b"a", b"b", b"c", b"d"] {
        store.set(k, b"v").unwrap();
    }

    // Same membership as forward [b, d); only the order flips.
    let entries = drain(store.reverse_iterator(Some(b"b"), Some(b"d")).unwrap());
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![b"c", b"b"]);
}

#[test]
fn reverse_iterator_full_range() {
    let store = memory_store();
    for k in [b"1", b"2", b"3"] {
        store.set(k, b"v").unwrap();
    }

    let entries = drain(store.reverse_iterator(None, None).unwrap());
    let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(keys, vec![b"3", b"2", b"1"]);
}

#[test]
fn iterator_domain_reports_requested_bounds() {
    let store = memory_store();
    let iter = store.iterator(Some(b"a"), Some(b"z")).unwrap();
    assert_eq!(iter.domain(), (Some(b"a".as_slice()), Some(b"z".as_slice())));

    let iter = store.reverse_iterator(None, None).unwrap();
    assert_eq!(iter.domain(), (None, None));
}

#[test]
fn iterator_snapshot_ignores_later_writes() {
    let store = memory_store();
    store.set(b"a", b"1").unwrap();

    let iter = store.iterator(None, None).unwrap();
    store.set(b"b", b"2").unwrap();

    let entries = drain(iter);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, b"a");
}

#[test]
fn batch_lifecycle_over_facade() {
    let store = memory_store();
    store.set(b"keep", b"old").unwrap();

    let mut batch = store.new_batch();
    batch.set(b"keep", b"new").unwrap();
    batch.set(b"added", b"1").unwrap();
    batch.delete(b"never-existed").unwrap();

    // Nothing visible before write.
    assert_eq!(store.get(b"keep").unwrap(), Some(b"old".to_vec()));
    assert_eq!(store.get(b"added").unwrap(), None);

    batch.write().unwrap();

    assert_eq!(store.get(b"keep").unwrap(), Some(b"new".to_vec()));
    assert_eq!(store.get(b"added").unwrap(), Some(b"1".to_vec()));

    // Strictly single-use.
    assert!(matches!(batch.set(b"x", b"y"), Err(StoreError::BatchClosed)));
    assert!(matches!(batch.write(), Err(StoreError::BatchClosed)));
}

#[test]
fn facade_over_file_provider_persists() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = file_store(dir.path());
        let mut batch = store.new_batch();
        batch.set(b"a", b"1").unwrap();
        batch.set(b"b", b"2").unwrap();
        batch.write_sync().unwrap();
        store.delete_sync(b"a").unwrap();
        store.close().unwrap();
    }

    let store = file_store(dir.path());
    assert_eq!(store.get(b"a").unwrap(), None);
    assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));

    let entries = drain(store.iterator(None, None).unwrap());
    assert_eq!(entries.len(), 1);
    store.close().unwrap();
}

#[test]
fn file_store_reports_disk_usage() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.set_sync(b"key", b"value").unwrap();

    let stats = store.stats();
    let usage: u64 = stats["store.disk_usage"].parse().unwrap();
    assert!(usage > 0);
}

#[test]
fn read_only_facade_reads_but_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = file_store(dir.path());
        store.set_sync(b"a", b"1").unwrap();
        store.close().unwrap();
    }

    let provider =
        FileProvider::open_with(dir.path(), FileOptions::new().read_only(true)).unwrap();
    let store = KvStore::new(Arc::new(provider));

    assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert!(matches!(
        store.set(b"b", b"2"),
        Err(StoreError::Provider(ProviderError::ReadOnly))
    ));
}

#[test]
fn second_writer_cannot_open_store() {
    let dir = tempfile::tempdir().unwrap();

    let _store = file_store(dir.path());
    let second = FileProvider::open(dir.path());
    assert!(matches!(second, Err(ProviderError::Locked)));
}
