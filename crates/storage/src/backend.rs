//! Storage backend trait definition.
//!
//! This module defines the [`StorageBackend`] trait, the core abstraction for
//! key-value storage in Cakewalk. All storage implementations (MemoryBackend,
//! hosted document stores, etc.) implement this trait.
//!
//! # Design Philosophy
//!
//! The trait provides a minimal, generic key-value interface:
//! - **Keys and values are bytes**: No assumptions about serialization format
//! - **Async by default**: All operations are async for non-blocking I/O
//! - **Per-key atomicity only**: A conditional create is the strongest
//!   primitive offered; there are no multi-key transactions
//! - **Prefix scans**: Ordered iteration over a key prefix stands in for
//!   the missing secondary indexes
//!
//! Domain-specific logic (catalog records, uniqueness rules) lives in the
//! layers built on top of this trait, never in the backends.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`StorageBackend`] trait
//! 2. Map backend-specific errors to [`StorageError`](crate::StorageError)
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for a reference implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;
use crate::types::KeyValue;

/// Abstract storage backend for key-value operations.
///
/// Backends are expected to be thread-safe (`Send + Sync`) and support
/// concurrent operations.
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair (unconditional upsert) |
/// | [`set_if_absent`](StorageBackend::set_if_absent) | Store only if the key does not exist |
/// | [`delete`](StorageBackend::delete) | Remove a key |
/// | [`scan_prefix`](StorageBackend::scan_prefix) | Retrieve all entries under a key prefix |
/// | [`health_check`](StorageBackend::health_check) | Verify backend availability |
///
/// # Example
///
/// ```
/// use cakewalk_storage::{MemoryBackend, StorageBackend};
/// use bytes::Bytes;
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// let value = backend.get(b"key").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("value")));
/// # }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))` if the key exists
    /// - `Ok(None)` if the key doesn't exist
    /// - `Err(...)` on storage errors
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair.
    ///
    /// If the key already exists, its value is overwritten.
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Stores a key-value pair only if the key does not already exist.
    ///
    /// The check-and-write is atomic with respect to other operations on
    /// the same key. This is the strongest conditional primitive the
    /// backend offers; it says nothing about any other key.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the value was written
    /// - `Ok(false)` if the key already existed (nothing written)
    async fn set_if_absent(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<bool>;

    /// Deletes a key.
    ///
    /// If the key doesn't exist, this is a no-op (returns `Ok(())`).
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Retrieves all key-value pairs whose key starts with `prefix`.
    ///
    /// Results are returned in key order. An empty prefix scans the
    /// entire store.
    async fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>>;

    /// Checks if the backend is healthy and accepting requests.
    ///
    /// Performs a lightweight check suitable for readiness probes.
    async fn health_check(&self) -> StorageResult<()>;
}
