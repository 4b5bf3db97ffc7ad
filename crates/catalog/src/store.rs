//! Typed store adapter.
//!
//! [`CatalogStore`] translates between structured catalog records and the
//! byte-oriented key-value backend: key layout, JSON marshal/unmarshal,
//! and error surfacing. No business rules live here.
//!
//! # Key layout
//!
//! | Record | Key |
//! |--------|-----|
//! | Product | `product/<id>` |
//! | Suggestion set | `suggestions/current` (fixed sentinel) |

use std::sync::Arc;

use cakewalk_storage::{StorageBackend, StorageError};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::CatalogResult,
    product::Product,
    suggestions::SuggestionSet,
};

/// Key prefix for product records.
const PRODUCT_PREFIX: &str = "product/";

/// Fixed key of the singleton suggestion record.
const SUGGESTIONS_KEY: &str = "suggestions/current";

/// Thin typed wrapper over the generic key-value backend.
#[derive(Clone)]
pub struct CatalogStore {
    backend: Arc<dyn StorageBackend>,
}

impl CatalogStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn product_key(id: &str) -> Vec<u8> {
        format!("{PRODUCT_PREFIX}{id}").into_bytes()
    }

    /// Fetches a product by id.
    pub async fn get_product(&self, id: &str) -> CatalogResult<Option<Product>> {
        let bytes = self.backend.get(&Self::product_key(id)).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Unconditionally upserts a product.
    pub async fn put_product(&self, product: &Product) -> CatalogResult<()> {
        let bytes = encode(product)?;
        self.backend.set(Self::product_key(&product.id), bytes).await?;
        Ok(())
    }

    /// Writes a product only if its id is not already taken.
    ///
    /// Returns `false` (without writing) when the id exists.
    pub async fn put_product_if_absent(&self, product: &Product) -> CatalogResult<bool> {
        let bytes = encode(product)?;
        Ok(self.backend.set_if_absent(Self::product_key(&product.id), bytes).await?)
    }

    /// Deletes a product by id. A missing id is a backend-level no-op.
    pub async fn delete_product(&self, id: &str) -> CatalogResult<()> {
        self.backend.delete(&Self::product_key(id)).await?;
        Ok(())
    }

    /// Scans every product record.
    pub async fn scan_products(&self) -> CatalogResult<Vec<Product>> {
        let entries = self.backend.scan_prefix(PRODUCT_PREFIX.as_bytes()).await?;
        entries.iter().map(|entry| decode(&entry.value)).collect()
    }

    /// Fetches the singleton suggestion record.
    pub async fn get_suggestions(&self) -> CatalogResult<Option<SuggestionSet>> {
        let bytes = self.backend.get(SUGGESTIONS_KEY.as_bytes()).await?;
        bytes.map(|bytes| decode(&bytes)).transpose()
    }

    /// Replaces the singleton suggestion record.
    pub async fn put_suggestions(&self, set: &SuggestionSet) -> CatalogResult<()> {
        let bytes = encode(set)?;
        self.backend.set(SUGGESTIONS_KEY.as_bytes().to_vec(), bytes).await?;
        Ok(())
    }

    /// Deletes the singleton suggestion record.
    pub async fn delete_suggestions(&self) -> CatalogResult<()> {
        self.backend.delete(SUGGESTIONS_KEY.as_bytes()).await?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> CatalogResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| StorageError::Serialization(e.to_string()).into())
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CatalogResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use cakewalk_storage::MemoryBackend;
    use chrono::Utc;

    use super::*;
    use crate::error::CatalogError;
    use crate::product::ProductDraft;

    fn store() -> CatalogStore {
        CatalogStore::new(Arc::new(MemoryBackend::new()))
    }

    fn product(id: &str, title: &str) -> Product {
        let draft: ProductDraft =
            serde_json::from_value(serde_json::json!({"title": title})).unwrap();
        draft.build(id.into(), true, Some(Utc::now()), Utc::now())
    }

    #[tokio::test]
    async fn test_product_round_trip() {
        let store = store();
        let stored = product("p-1", "Mocha");

        store.put_product(&stored).await.unwrap();
        let loaded = store.get_product("p-1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_get_missing_product_is_none() {
        let store = store();
        assert!(store.get_product("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_if_absent_reports_conflict() {
        let store = store();
        let first = product("p-1", "Mocha");
        let second = product("p-1", "Usurper");

        assert!(store.put_product_if_absent(&first).await.unwrap());
        assert!(!store.put_product_if_absent(&second).await.unwrap());

        let loaded = store.get_product("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Mocha");
    }

    #[tokio::test]
    async fn test_scan_products_skips_suggestions() {
        let store = store();
        store.put_product(&product("p-1", "Mocha")).await.unwrap();
        store
            .put_suggestions(&SuggestionSet {
                id: crate::suggestions::SUGGESTION_SET_ID.into(),
                suggestions: Default::default(),
                created_at: None,
                updated_at: None,
            })
            .await
            .unwrap();

        let products = store.scan_products().await.unwrap();
        assert_eq!(products.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_surfaces_database_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(b"product/bad".to_vec(), b"{not-json".to_vec()).await.unwrap();
        let store = CatalogStore::new(backend);

        let result = store.get_product("bad").await;
        assert!(matches!(result, Err(CatalogError::Database(_))), "got: {result:?}");
    }

    #[tokio::test]
    async fn test_suggestions_round_trip_and_delete() {
        let store = store();
        let mut suggestions = std::collections::BTreeMap::new();
        suggestions.insert("flavors".to_string(), vec!["Mocha".to_string()]);
        let set = SuggestionSet {
            id: crate::suggestions::SUGGESTION_SET_ID.into(),
            suggestions,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };

        store.put_suggestions(&set).await.unwrap();
        assert_eq!(store.get_suggestions().await.unwrap().unwrap(), set);

        store.delete_suggestions().await.unwrap();
        assert!(store.get_suggestions().await.unwrap().is_none());
    }
}
