//! Common types used across storage operations.

use bytes::Bytes;

/// A key-value pair returned from prefix scans.
///
/// Represents a single entry from the storage backend, containing both
/// the key and its associated value as byte sequences.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use cakewalk_storage::KeyValue;
///
/// let kv = KeyValue::new(Bytes::from("product/123"), Bytes::from(r#"{"title":"Mocha"}"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key identifying this entry.
    pub key: Bytes,

    /// The value stored at this key.
    pub value: Bytes,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}
