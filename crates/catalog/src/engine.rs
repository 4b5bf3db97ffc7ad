//! Catalog integrity engine.
//!
//! [`CatalogEngine`] owns every mutation of catalog records and enforces
//! the invariants the backing store cannot:
//!
//! - title uniqueness (case-insensitive, trimmed) via a full scan at write
//!   time — the store has no secondary index, so this is O(n) by design
//! - id uniqueness via a conditional create (per-key atomic)
//! - existence checks before update/delete, so a no-op never reports
//!   success
//!
//! # Known races
//!
//! The store offers per-key atomicity only, so two gaps are accepted and
//! intentional rather than papered over:
//!
//! - two concurrent creates with the same title can both pass the scan
//!   before either writes; the conditional write guards the id key, not
//!   the title
//! - update's existence check and its write are separate operations; a
//!   concurrent delete between them is revived by the write
//!   (last-write-wins)

use std::{collections::BTreeMap, sync::Arc};

use cakewalk_storage::{
    clock::{Clock, SystemClock},
    StorageBackend,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    error::{CatalogError, CatalogResult},
    product::{normalize_title, Product, ProductDraft},
    store::CatalogStore,
    suggestions::{dedupe_case_insensitive, SuggestionSet, SUGGESTION_SET_ID},
};

/// Length of the random id suffix.
const ID_SUFFIX_LENGTH: usize = 8;

/// Implements create/update/delete/list semantics with uniqueness and
/// existence invariants on top of [`CatalogStore`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use cakewalk_catalog::{CatalogEngine, ProductDraft};
/// use cakewalk_storage::MemoryBackend;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = CatalogEngine::new(Arc::new(MemoryBackend::new()));
///
/// let draft: ProductDraft = serde_json::from_str(r#"{"title": "Red Velvet"}"#)?;
/// let product = engine.create_product(draft).await?;
/// assert_eq!(product.title, "Red Velvet");
/// # Ok(())
/// # }
/// ```
pub struct CatalogEngine {
    store: CatalogStore,
    clock: Arc<dyn Clock>,
}

impl CatalogEngine {
    /// Creates an engine over the given backend, using the system clock.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { store: CatalogStore::new(backend), clock: Arc::new(SystemClock) }
    }

    /// Replaces the time source. Intended for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a new product.
    ///
    /// Validates the draft, checks title uniqueness against every existing
    /// record (normalized comparison), then persists under a freshly
    /// generated id with an if-absent condition.
    ///
    /// The uniqueness check and the write are not atomic: two concurrent
    /// creates with the same title can both pass the check. The
    /// conditional write defends against id collision only.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Validation`] for a bad title
    /// - [`CatalogError::DuplicateTitle`] if the normalized title is taken
    /// - [`CatalogError::DuplicateId`] if the generated id is taken
    /// - [`CatalogError::Database`] on backend failures
    #[tracing::instrument(skip(self, draft))]
    pub async fn create_product(&self, draft: ProductDraft) -> CatalogResult<Product> {
        draft.validate()?;
        self.check_title_unique(&draft.title, None).await?;

        let now = self.clock.now();
        let id = self.generate_id();
        // Creation always starts active, whatever the draft says
        let product = draft.build(id, true, Some(now), now);

        if !self.store.put_product_if_absent(&product).await? {
            tracing::warn!(id = %product.id, "generated id collided with existing record");
            return Err(CatalogError::DuplicateId(product.id));
        }

        tracing::debug!(id = %product.id, title = %product.title, "product created");
        Ok(product)
    }

    /// Replaces an existing product.
    ///
    /// All fields are replaced except `id` and `created_at`; `updated_at`
    /// is bumped. The write is unconditional (last-write-wins) — no
    /// concurrency token is carried.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MissingId`] for an empty id
    /// - [`CatalogError::Validation`] for a bad title
    /// - [`CatalogError::DuplicateTitle`] if another record holds the title
    /// - [`CatalogError::NotFound`] if no record exists under `id`; nothing
    ///   is written in that case
    /// - [`CatalogError::Database`] on backend failures
    #[tracing::instrument(skip(self, draft))]
    pub async fn update_product(&self, id: &str, draft: ProductDraft) -> CatalogResult<Product> {
        if id.trim().is_empty() {
            return Err(CatalogError::MissingId);
        }
        draft.validate()?;
        self.check_title_unique(&draft.title, Some(id)).await?;

        let current = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        let now = self.clock.now();
        let is_active = draft.is_active;
        let product = draft.build(current.id, is_active, current.created_at, now);

        self.store.put_product(&product).await?;

        tracing::debug!(id = %product.id, "product updated");
        Ok(product)
    }

    /// Deletes a product by id.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MissingId`] for an empty id
    /// - [`CatalogError::NotFound`] if no record exists under `id` — a
    ///   repeat delete reports this, never success
    /// - [`CatalogError::Database`] on backend failures
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> CatalogResult<()> {
        if id.trim().is_empty() {
            return Err(CatalogError::MissingId);
        }
        if self.store.get_product(id).await?.is_none() {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        self.store.delete_product(id).await?;

        tracing::debug!(id, "product deleted");
        Ok(())
    }

    /// Fetches a single product by id.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::MissingId`] for an empty id
    /// - [`CatalogError::NotFound`] if no record exists under `id`
    /// - [`CatalogError::Database`] on backend failures
    pub async fn get_product(&self, id: &str) -> CatalogResult<Product> {
        if id.trim().is_empty() {
            return Err(CatalogError::MissingId);
        }
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Lists all products, newest first.
    ///
    /// Sorting is a pure function of the scanned snapshot; records missing
    /// `created_at` sort as oldest.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self) -> CatalogResult<Vec<Product>> {
        let mut products = self.store.scan_products().await?;
        // Descending by creation time; None (< any Some) lands last
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    /// Fetches the singleton suggestion record, if one has been written.
    pub async fn get_suggestions(&self) -> CatalogResult<Option<SuggestionSet>> {
        self.store.get_suggestions().await
    }

    /// Creates or replaces the singleton suggestion record.
    ///
    /// Values are deduplicated case-insensitively per field (first
    /// occurrence wins, insertion order kept). The first write sets
    /// `created_at`; replacements preserve it and bump `updated_at`.
    #[tracing::instrument(skip(self, suggestions))]
    pub async fn put_suggestions(
        &self,
        suggestions: BTreeMap<String, Vec<String>>,
    ) -> CatalogResult<SuggestionSet> {
        let now = self.clock.now();
        let deduped = suggestions
            .into_iter()
            .map(|(field, values)| (field, dedupe_case_insensitive(values)))
            .collect();

        let existing = self.store.get_suggestions().await?;
        let set = SuggestionSet {
            id: SUGGESTION_SET_ID.to_string(),
            suggestions: deduped,
            created_at: existing.and_then(|s| s.created_at).or(Some(now)),
            updated_at: Some(now),
        };

        self.store.put_suggestions(&set).await?;
        Ok(set)
    }

    /// Clears the singleton suggestion record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no record exists — a repeat
    /// clear reports this, never success.
    #[tracing::instrument(skip(self))]
    pub async fn delete_suggestions(&self) -> CatalogResult<()> {
        if self.store.get_suggestions().await?.is_none() {
            return Err(CatalogError::NotFound(SUGGESTION_SET_ID.to_string()));
        }
        self.store.delete_suggestions().await?;
        Ok(())
    }

    /// Scans all records and rejects a normalized-title collision,
    /// excluding `own_id` (for updates).
    async fn check_title_unique(&self, title: &str, own_id: Option<&str>) -> CatalogResult<()> {
        let normalized = normalize_title(title);
        let existing = self.store.scan_products().await?;
        let taken = existing
            .iter()
            .filter(|p| own_id != Some(p.id.as_str()))
            .any(|p| normalize_title(&p.title) == normalized);
        if taken {
            return Err(CatalogError::DuplicateTitle(title.trim().to_string()));
        }
        Ok(())
    }

    /// Generates an id from the current time plus a random suffix.
    ///
    /// The time component keeps ids roughly sortable; the suffix makes
    /// collision negligible. The conditional write catches the remainder.
    fn generate_id(&self) -> String {
        let millis = self.clock.now().timestamp_millis();
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_SUFFIX_LENGTH)
            .map(char::from)
            .collect();
        format!("{millis}-{}", suffix.to_lowercase())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use cakewalk_storage::{testutil::ManualClock, MemoryBackend};
    use serde_json::json;

    use super::*;
    use crate::product::{PriceRange, WeightPrice, WeightRange};

    const NOW: i64 = 1_700_000_000;

    fn engine() -> (CatalogEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch_seconds(NOW));
        let engine = CatalogEngine::new(Arc::new(MemoryBackend::new())).with_clock(clock.clone());
        (engine, clock)
    }

    fn draft(title: &str) -> ProductDraft {
        serde_json::from_value(json!({ "title": title })).unwrap()
    }

    #[tokio::test]
    async fn test_create_populates_server_fields() {
        let (engine, _) = engine();

        let product = engine.create_product(draft("Red Velvet")).await.unwrap();

        assert!(!product.id.is_empty());
        assert!(product.is_active);
        assert_eq!(product.created_at, product.updated_at);
        assert_eq!(product.created_at.unwrap().timestamp(), NOW);
    }

    #[tokio::test]
    async fn test_create_duplicate_title_case_and_whitespace_insensitive() {
        let (engine, _) = engine();

        engine.create_product(draft("Red Velvet")).await.unwrap();
        let result = engine.create_product(draft("  red velvet  ")).await;

        assert!(
            matches!(result, Err(CatalogError::DuplicateTitle(ref t)) if t == "red velvet"),
            "got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_create_distinct_titles_coexist() {
        let (engine, _) = engine();

        engine.create_product(draft("Red Velvet")).await.unwrap();
        engine.create_product(draft("Red Velvet Deluxe")).await.unwrap();

        assert_eq!(engine.list_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_customizable_without_ranges_stores_no_fixed_fields() {
        let (engine, _) = engine();

        let d: ProductDraft = serde_json::from_value(json!({
            "title": "Build Your Own",
            "customizable": true,
        }))
        .unwrap();

        let product = engine.create_product(d).await.unwrap();
        assert!(product.customizable);
        assert!(product.price_range.is_none());
        assert!(product.weight_range.is_none());
        assert!(product.available_weights.is_none());
        assert!(product.default_weight.is_none());

        // The stored wire form must not carry the fixed-variant fields either
        let listed = engine.list_products().await.unwrap();
        let json = serde_json::to_value(&listed[0]).unwrap();
        assert!(json.get("availableWeights").is_none());
        assert!(json.get("defaultWeight").is_none());
    }

    #[tokio::test]
    async fn test_create_strips_cross_variant_payload() {
        let (engine, _) = engine();

        let d: ProductDraft = serde_json::from_value(json!({
            "title": "Fixed Cake",
            "customizable": false,
            "priceRange": {"min": 1.0, "max": 2.0},
            "weightRange": {"min": 0.5, "max": 1.0},
            "availableWeights": [{"weight": 1.0, "price": 20.0}],
            "defaultWeight": 1.0,
        }))
        .unwrap();

        let product = engine.create_product(d).await.unwrap();
        assert!(product.price_range.is_none());
        assert!(product.weight_range.is_none());
        assert_eq!(
            product.available_weights,
            Some(vec![WeightPrice { weight: 1.0, price: 20.0 }])
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_titles() {
        let (engine, _) = engine();

        let result = engine.create_product(draft("   ")).await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));

        let result = engine.create_product(draft(&"x".repeat(101))).await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_all_but_id_and_created_at() {
        let (engine, clock) = engine();

        let original = engine.create_product(draft("Red Velvet")).await.unwrap();
        clock.advance(Duration::from_secs(60));

        let d: ProductDraft = serde_json::from_value(json!({
            "title": "Red Velvet Supreme",
            "customizable": true,
            "isActive": false,
            "priceRange": {"min": 30.0, "max": 90.0},
            "weightRange": {"min": 1.0, "max": 4.0},
        }))
        .unwrap();

        let updated = engine.update_product(&original.id, d).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, "Red Velvet Supreme");
        assert!(!updated.is_active);
        assert_eq!(updated.price_range, Some(PriceRange { min: 30.0, max: 90.0 }));
        assert_eq!(updated.weight_range, Some(WeightRange { min: 1.0, max: 4.0 }));
        assert_eq!(updated.updated_at.unwrap().timestamp(), NOW + 60);
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn test_update_nonexistent_writes_nothing() {
        let (engine, _) = engine();

        let result = engine.update_product("no-such-id", draft("Ghost")).await;
        assert!(
            matches!(result, Err(CatalogError::NotFound(ref id)) if id == "no-such-id"),
            "got: {result:?}"
        );
        assert!(engine.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_empty_id_is_missing_id() {
        let (engine, _) = engine();
        let result = engine.update_product("  ", draft("Anything")).await;
        assert!(matches!(result, Err(CatalogError::MissingId)));
    }

    #[tokio::test]
    async fn test_update_title_uniqueness_excludes_self() {
        let (engine, _) = engine();

        let a = engine.create_product(draft("Red Velvet")).await.unwrap();
        engine.create_product(draft("Carrot Cake")).await.unwrap();

        // Re-saving under its own (re-cased) title is fine
        let updated = engine.update_product(&a.id, draft("RED VELVET")).await.unwrap();
        assert_eq!(updated.title, "RED VELVET");

        // Taking another record's title is not
        let result = engine.update_product(&a.id, draft("carrot cake")).await;
        assert!(matches!(result, Err(CatalogError::DuplicateTitle(_))), "got: {result:?}");
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let (engine, _) = engine();

        let product = engine.create_product(draft("Red Velvet")).await.unwrap();

        engine.delete_product(&product.id).await.unwrap();
        assert!(engine.list_products().await.unwrap().is_empty());

        // The second delete must not report success for a no-op
        let result = engine.delete_product(&product.id).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))), "got: {result:?}");
    }

    #[tokio::test]
    async fn test_get_product() {
        let (engine, _) = engine();

        let created = engine.create_product(draft("Red Velvet")).await.unwrap();
        let fetched = engine.get_product(&created.id).await.unwrap();
        assert_eq!(fetched, created);

        let result = engine.get_product("no-such-id").await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let (engine, clock) = engine();

        engine.create_product(draft("First")).await.unwrap();
        clock.advance(Duration::from_secs(10));
        engine.create_product(draft("Second")).await.unwrap();
        clock.advance(Duration::from_secs(10));
        engine.create_product(draft("Third")).await.unwrap();

        let titles: Vec<String> =
            engine.list_products().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn test_list_records_without_created_at_sort_oldest() {
        let clock = Arc::new(ManualClock::at_epoch_seconds(NOW));
        let backend = Arc::new(MemoryBackend::new());
        let engine =
            CatalogEngine::new(backend.clone() as Arc<dyn StorageBackend>).with_clock(clock);

        // A legacy record with no timestamps, written behind the engine's back
        backend
            .set(
                b"product/legacy".to_vec(),
                br#"{"id":"legacy","title":"Legacy","customizable":false,"isActive":true}"#.to_vec(),
            )
            .await
            .unwrap();

        engine.create_product(draft("Fresh")).await.unwrap();

        let titles: Vec<String> =
            engine.list_products().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Fresh", "Legacy"]);
    }

    #[tokio::test]
    async fn test_generated_ids_unique_within_same_instant() {
        let (engine, _) = engine();

        // The clock is frozen, so uniqueness rests on the random suffix
        let a = engine.create_product(draft("One")).await.unwrap();
        let b = engine.create_product(draft("Two")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_suggestions_lifecycle() {
        let (engine, clock) = engine();

        assert!(engine.get_suggestions().await.unwrap().is_none());

        // First write creates
        let mut suggestions = BTreeMap::new();
        suggestions.insert(
            "flavors".to_string(),
            vec!["Chocolate".to_string(), "chocolate".to_string(), "Vanilla".to_string()],
        );
        let set = engine.put_suggestions(suggestions).await.unwrap();
        assert_eq!(set.suggestions["flavors"], vec!["Chocolate", "Vanilla"]);
        let created_at = set.created_at.unwrap();

        // Replacement preserves created_at, bumps updated_at
        clock.advance(Duration::from_secs(30));
        let mut replacement = BTreeMap::new();
        replacement.insert("fillings".to_string(), vec!["Praline".to_string()]);
        let set = engine.put_suggestions(replacement).await.unwrap();
        assert_eq!(set.created_at.unwrap(), created_at);
        assert_eq!(set.updated_at.unwrap().timestamp(), NOW + 30);
        assert!(!set.suggestions.contains_key("flavors"), "replace, not merge");

        // Delete clears; repeat delete reports NotFound
        engine.delete_suggestions().await.unwrap();
        assert!(engine.get_suggestions().await.unwrap().is_none());
        let result = engine.delete_suggestions().await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
