//! # Cakewalk Storage
//!
//! Generic key-value storage abstraction for Cakewalk services.
//!
//! This crate provides:
//! - **[`StorageBackend`]**: The core async key-value trait all backends implement
//! - **[`MemoryBackend`]**: In-memory reference implementation for tests and development
//! - **[`StorageError`]**: Canonical error taxonomy shared by all backends
//!
//! ## Design
//!
//! Keys and values are raw bytes; serialization is the caller's concern.
//! The trait deliberately offers only per-key atomicity: there are no
//! multi-key transactions and no secondary indexes. Callers that need
//! cross-key invariants (e.g. uniqueness over a non-key field) must
//! enforce them at the application layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Storage backend trait definition.
pub mod backend;
/// Injectable time source.
pub mod clock;
/// Storage error types.
pub mod error;
/// In-memory backend implementation.
pub mod memory;
/// Shared storage types.
pub mod types;

/// Test helpers (controllable clock).
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use backend::StorageBackend;
pub use clock::{Clock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use types::KeyValue;
