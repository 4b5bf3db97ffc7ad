//! In-memory storage backend implementation.
//!
//! This module provides [`MemoryBackend`], an in-memory implementation of
//! [`StorageBackend`] suitable for testing and development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Ordered storage**: Keys are stored in a [`BTreeMap`] for efficient prefix scans
//! - **Per-key conditional writes**: `set_if_absent` is atomic under the write lock
//!
//! # Example
//!
//! ```
//! use cakewalk_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - No replication or distributed features

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use crate::types::KeyValue;

/// In-memory storage backend using [`BTreeMap`].
///
/// Primarily intended for testing, but usable for development or
/// small-scale deployments where persistence is not required.
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Bytes>>>,
}

impl MemoryBackend {
    /// Creates a new, empty in-memory storage backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let data = self.data.read();
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let mut data = self.data.write();
        data.insert(key, Bytes::from(value));
        Ok(())
    }

    async fn set_if_absent(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<bool> {
        let mut data = self.data.write();
        match data.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => Ok(false),
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(Bytes::from(value));
                Ok(true)
            },
        }
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        data.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>> {
        let data = self.data.read();

        let results: Vec<KeyValue> = data
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(k, v)| KeyValue::new(Bytes::copy_from_slice(k), v.clone()))
            .collect();

        Ok(results)
    }

    async fn health_check(&self) -> StorageResult<()> {
        // Acquiring the read lock verifies we're not deadlocked
        let _unused = self.data.read();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_operations() {
        let backend = MemoryBackend::new();

        // Set and get
        backend.set(b"key1".to_vec(), b"value1".to_vec()).await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value1")));

        // Delete
        backend.delete(b"key1").await.unwrap();
        let value = backend.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let backend = MemoryBackend::new();

        backend.set(b"key".to_vec(), b"old".to_vec()).await.unwrap();
        backend.set(b"key".to_vec(), b"new".to_vec()).await.unwrap();

        assert_eq!(backend.get(b"key").await.unwrap(), Some(Bytes::from("new")));
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let backend = MemoryBackend::new();

        let written = backend.set_if_absent(b"key".to_vec(), b"first".to_vec()).await.unwrap();
        assert!(written);

        // Second conditional write must not clobber the first
        let written = backend.set_if_absent(b"key".to_vec(), b"second".to_vec()).await.unwrap();
        assert!(!written);

        assert_eq!(backend.get(b"key").await.unwrap(), Some(Bytes::from("first")));
    }

    #[tokio::test]
    async fn test_set_if_absent_after_delete() {
        let backend = MemoryBackend::new();

        backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
        backend.delete(b"key").await.unwrap();

        let written = backend.set_if_absent(b"key".to_vec(), b"again".to_vec()).await.unwrap();
        assert!(written);
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let backend = MemoryBackend::new();

        backend.set(b"product/a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"product/b".to_vec(), b"2".to_vec()).await.unwrap();
        backend.set(b"suggestions/current".to_vec(), b"3".to_vec()).await.unwrap();

        let scanned = backend.scan_prefix(b"product/").await.unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].key, Bytes::from("product/a"));
        assert_eq!(scanned[1].key, Bytes::from("product/b"));
    }

    #[tokio::test]
    async fn test_scan_prefix_empty_prefix_returns_all() {
        let backend = MemoryBackend::new();

        backend.set(b"a".to_vec(), b"1".to_vec()).await.unwrap();
        backend.set(b"b".to_vec(), b"2".to_vec()).await.unwrap();

        let scanned = backend.scan_prefix(b"").await.unwrap();
        assert_eq!(scanned.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_prefix_no_matches() {
        let backend = MemoryBackend::new();

        backend.set(b"product/a".to_vec(), b"1".to_vec()).await.unwrap();

        let scanned = backend.scan_prefix(b"order/").await.unwrap();
        assert!(scanned.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let backend = MemoryBackend::new();
        assert!(backend.delete(b"missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = MemoryBackend::new();
        assert!(backend.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_clone_shares_data() {
        let backend1 = MemoryBackend::new();
        let backend2 = backend1.clone();

        backend1.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();

        let value = backend2.get(b"key").await.unwrap();
        assert_eq!(value, Some(Bytes::from("value")));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Every key visible in a prefix scan must actually carry the prefix,
            /// and every stored key carrying the prefix must be visible.
            #[test]
            fn scan_prefix_is_exact(
                keys in proptest::collection::btree_set(
                    proptest::collection::vec(any::<u8>(), 1..8), 0..24),
                prefix in proptest::collection::vec(any::<u8>(), 0..3),
            ) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                rt.block_on(async {
                    let backend = MemoryBackend::new();
                    for key in &keys {
                        backend.set(key.clone(), b"v".to_vec()).await.unwrap();
                    }

                    let scanned = backend.scan_prefix(&prefix).await.unwrap();
                    let scanned_keys: Vec<Vec<u8>> =
                        scanned.iter().map(|kv| kv.key.to_vec()).collect();

                    let expected: Vec<Vec<u8>> = keys
                        .iter()
                        .filter(|k| k.starts_with(&prefix[..]))
                        .cloned()
                        .collect();

                    assert_eq!(scanned_keys, expected);
                });
            }
        }
    }
}
