// Store Tests
// Key-value stores, the transaction cache and the versioned record envelope

use custody::identity::{ParticipantId, WalletId};
use custody::custody::{CustodyRecord, CustodyStore};
use custody::quorum::QuorumPolicy;
use custody::storage::{
    decode_record, encode_record, keys, KvRead, KvStore, MemStore, SledStore, StoreError,
    TxCache, WriteBatch,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

fn record(wallet: &str) -> CustodyRecord {
    CustodyRecord::new(
        WalletId::parse(wallet).unwrap(),
        QuorumPolicy::unweighted(1, vec![ParticipantId::parse("alice").unwrap()]),
        BTreeMap::from([("upaxi".to_string(), 10)]),
        0,
    )
}

fn put(store: &mut impl KvStore, key: &[u8], value: &[u8]) {
    let mut batch = WriteBatch::new();
    batch.put(key.to_vec(), value.to_vec());
    store.apply_batch(batch).unwrap();
}

// ============================================================================
// STORE CREATION AND BASIC OPERATIONS
// ============================================================================

#[test]
fn test_store_open_new() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledStore::open(temp_dir.path()).unwrap();

    assert!(store.is_empty());
}

#[test]
fn test_store_open_existing() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut store = SledStore::open(temp_dir.path()).unwrap();
        put(&mut store, b"test_key", b"test_value");
        store.flush().unwrap();
    }

    {
        let store = SledStore::open(temp_dir.path()).unwrap();
        assert_eq!(
            store.get(b"test_key").unwrap(),
            Some(b"test_value".to_vec())
        );
    }
}

#[test]
fn test_store_get_nonexistent() {
    let store = MemStore::new();
    assert_eq!(store.get(b"missing").unwrap(), None);
}

#[test]
fn test_batch_delete_and_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = SledStore::open(temp_dir.path()).unwrap();
    put(&mut store, b"a", b"1");
    put(&mut store, b"b", b"2");

    let mut batch = WriteBatch::new();
    batch.put(b"a".to_vec(), b"updated".to_vec());
    batch.delete(b"b".to_vec());
    assert_eq!(batch.len(), 2);
    store.apply_batch(batch).unwrap();

    assert_eq!(store.get(b"a").unwrap(), Some(b"updated".to_vec()));
    assert_eq!(store.get(b"b").unwrap(), None);
}

#[test]
fn test_list_keys_with_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let mut sled = SledStore::open(temp_dir.path()).unwrap();
    let mut mem = MemStore::new();

    for store in [&mut sled as &mut dyn KvStore, &mut mem as &mut dyn KvStore] {
        let mut batch = WriteBatch::new();
        batch.put(b"p:3".to_vec(), b"c".to_vec());
        batch.put(b"p:1".to_vec(), b"a".to_vec());
        batch.put(b"q:1".to_vec(), b"x".to_vec());
        batch.put(b"p:2".to_vec(), b"b".to_vec());
        store.apply_batch(batch).unwrap();
    }

    // both backends return the same ordered view
    let expected = vec![
        (b"p:1".to_vec(), b"a".to_vec()),
        (b"p:2".to_vec(), b"b".to_vec()),
        (b"p:3".to_vec(), b"c".to_vec()),
    ];
    assert_eq!(sled.scan_prefix(b"p:").unwrap(), expected);
    assert_eq!(mem.scan_prefix(b"p:").unwrap(), expected);
}

#[test]
fn test_storage_stats() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = SledStore::open(temp_dir.path()).unwrap();
    put(&mut store, b"one", b"1");
    put(&mut store, b"two", b"2");

    assert_eq!(store.stats().key_count, 2);
}

// ============================================================================
// TRANSACTION CACHE
// ============================================================================

#[test]
fn test_cache_commit_applies_everything() {
    let mut store = MemStore::new();
    put(&mut store, b"k:old", b"gone soon");

    let batch = {
        let mut cache = TxCache::new(&store);
        cache.set(b"k:new".to_vec(), b"fresh".to_vec());
        cache.delete(b"k:old".to_vec());
        assert_eq!(cache.pending_writes(), 2);
        cache.into_batch()
    };
    store.apply_batch(batch).unwrap();

    assert_eq!(store.get(b"k:new").unwrap(), Some(b"fresh".to_vec()));
    assert_eq!(store.get(b"k:old").unwrap(), None);
}

#[test]
fn test_cache_layers_over_sled() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = SledStore::open(temp_dir.path()).unwrap();
    put(&mut store, b"k:1", b"committed");

    let mut cache = TxCache::new(&store);
    cache.set(b"k:2".to_vec(), b"staged".to_vec());

    assert_eq!(cache.scan_prefix(b"k:").unwrap().len(), 2);
    assert_eq!(store.scan_prefix(b"k:").unwrap().len(), 1);
}

// ============================================================================
// VERSIONED RECORDS
// ============================================================================

#[test]
fn test_custody_record_persists_across_reopens() {
    let temp_dir = TempDir::new().unwrap();
    let wallet = WalletId::parse("vault-1").unwrap();

    {
        let mut store = SledStore::open(temp_dir.path()).unwrap();
        let mut batch = WriteBatch::new();
        batch.put(
            keys::custody_key(wallet.as_str()),
            encode_record(&record("vault-1")).unwrap(),
        );
        store.apply_batch(batch).unwrap();
        store.flush().unwrap();
    }

    let store = SledStore::open(temp_dir.path()).unwrap();
    let loaded = CustodyStore::get(&store, &wallet).unwrap().unwrap();
    assert_eq!(loaded, record("vault-1"));
    assert!(CustodyStore::exists(&store, &wallet).unwrap());
}

#[test]
fn test_custody_list_in_wallet_order() {
    let mut store = MemStore::new();
    let mut batch = WriteBatch::new();
    for name in ["w-b", "w-a", "w-c"] {
        batch.put(keys::custody_key(name), encode_record(&record(name)).unwrap());
    }
    store.apply_batch(batch).unwrap();

    let wallets: Vec<String> = CustodyStore::list(&store)
        .unwrap()
        .iter()
        .map(|r| r.wallet().to_string())
        .collect();
    assert_eq!(wallets, vec!["w-a", "w-b", "w-c"]);
}

#[test]
fn test_corrupted_data_returns_error() {
    let mut store = MemStore::new();
    put(&mut store, &keys::custody_key("broken"), &[1, 0, 0xff, 0xff, 0xff]);

    let result = CustodyStore::get(&store, &WalletId::parse("broken").unwrap());
    assert!(matches!(result, Err(StoreError::DeserializationFailed(_))));
}

#[test]
fn test_record_version_is_checked() {
    let mut bytes = encode_record(&42u64).unwrap();
    // version is the leading varint
    bytes[0] = 2;

    assert!(matches!(
        decode_record::<u64>(&bytes),
        Err(StoreError::UnsupportedVersion {
            expected: 1,
            found: 2
        })
    ));
}
