//! # Cakewalk Catalog
//!
//! Catalog records and the integrity rules that govern them.
//!
//! The backing store is a generic key-value backend
//! ([`cakewalk_storage::StorageBackend`]) offering only per-key atomicity:
//! no multi-key transactions, no secondary indexes. This crate layers the
//! catalog's invariants on top:
//!
//! - **Title uniqueness** (case-insensitive, trimmed) enforced by an O(n)
//!   scan at write time — an accepted trade-off, see
//!   [`CatalogEngine::create_product`](engine::CatalogEngine::create_product)
//! - **Conditional creation**: new ids are written with an
//!   if-absent condition so an id collision can never clobber a record
//! - **Existence before mutation**: updates and deletes report
//!   [`CatalogError::NotFound`](error::CatalogError) before touching the store
//!
//! [`store::CatalogStore`] is the thin typed adapter (marshal/unmarshal and
//! key layout only); every business rule lives in
//! [`engine::CatalogEngine`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Catalog integrity engine.
pub mod engine;
/// Catalog error types.
pub mod error;
/// Product records and validation.
pub mod product;
/// Typed store adapter.
pub mod store;
/// Suggestion set records.
pub mod suggestions;

pub use engine::CatalogEngine;
pub use error::{CatalogError, CatalogResult};
pub use product::{PriceRange, Product, ProductDraft, WeightPrice, WeightRange, MAX_TITLE_LENGTH};
pub use store::CatalogStore;
pub use suggestions::{SuggestionSet, SUGGESTION_SET_ID};
