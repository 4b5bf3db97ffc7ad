//! End-to-end integrity tests over the public catalog API.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use cakewalk_catalog::{CatalogEngine, CatalogError, ProductDraft};
use cakewalk_storage::MemoryBackend;
use serde_json::json;

fn draft(title: &str) -> ProductDraft {
    serde_json::from_value(json!({ "title": title })).unwrap()
}

#[tokio::test]
async fn full_product_lifecycle() {
    let engine = CatalogEngine::new(Arc::new(MemoryBackend::new()));

    let created = engine
        .create_product(
            serde_json::from_value(json!({
                "title": "Red Velvet",
                "customizable": false,
                "availableWeights": [
                    {"weight": 0.5, "price": 18.0},
                    {"weight": 1.0, "price": 32.0},
                ],
                "defaultWeight": 0.5,
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let fetched = engine.get_product(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = engine
        .update_product(
            &created.id,
            serde_json::from_value(json!({
                "title": "Red Velvet",
                "customizable": false,
                "availableWeights": [{"weight": 1.0, "price": 30.0}],
                "defaultWeight": 1.0,
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.default_weight, Some(1.0));

    let listed = engine.list_products().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], updated);

    engine.delete_product(&created.id).await.unwrap();
    let result = engine.get_product(&created.id).await;
    assert!(matches!(result, Err(CatalogError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_creates_with_distinct_titles_all_land() {
    let engine = Arc::new(CatalogEngine::new(Arc::new(MemoryBackend::new())));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.create_product(draft(&format!("Cake #{i}"))).await
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let product = handle.await.unwrap().unwrap();
        assert!(ids.insert(product.id), "ids must be unique");
    }

    assert_eq!(engine.list_products().await.unwrap().len(), 16);
}

#[tokio::test]
async fn duplicate_title_rejected_across_sequential_writers() {
    let engine = CatalogEngine::new(Arc::new(MemoryBackend::new()));

    engine.create_product(draft("Opera")).await.unwrap();

    // Same normalized title under various spellings
    for spelling in ["opera", "OPERA", "  Opera  "] {
        let result = engine.create_product(draft(spelling)).await;
        assert!(
            matches!(result, Err(CatalogError::DuplicateTitle(_))),
            "spelling {spelling:?} got: {result:?}"
        );
    }

    assert_eq!(engine.list_products().await.unwrap().len(), 1);
}
