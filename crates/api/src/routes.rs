//! Router and handlers.
//!
//! Handlers are thin: decode the request, delegate to the catalog engine,
//! wrap the outcome in the response envelope. Every `/api/*` route sits
//! behind the authorization gate; `/health` does not.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use cakewalk_authn::AuthenticatedIdentity;
use cakewalk_catalog::{Product, ProductDraft, SuggestionSet};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    auth,
    response::{ApiError, ApiResponse},
    AppState,
};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Payload for replacing the suggestion set.
#[derive(Debug, Deserialize)]
pub struct SuggestionsPayload {
    /// Suggestion strings per field name.
    pub suggestions: BTreeMap<String, Vec<String>>,
}

/// Health check endpoint.
///
/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into(), version: env!("CARGO_PKG_VERSION").into() })
}

/// GET /api/products
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state.engine.list_products().await?;
    Ok(Json(ApiResponse::ok("Products retrieved", products)))
}

/// POST /api/products
async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = state.engine.create_product(draft).await?;
    tracing::info!(subject = %identity.subject, id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Product created", product))))
}

/// GET /api/products/:id
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state.engine.get_product(&id).await?;
    Ok(Json(ApiResponse::ok("Product retrieved", product)))
}

/// PUT /api/products/:id
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state.engine.update_product(&id, draft).await?;
    tracing::info!(subject = %identity.subject, id = %product.id, "product updated");
    Ok(Json(ApiResponse::ok("Product updated", product)))
}

/// DELETE /api/products/:id
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state.engine.delete_product(&id).await?;
    tracing::info!(subject = %identity.subject, id = %id, "product deleted");
    Ok(Json(ApiResponse::ok_empty("Product deleted")))
}

/// GET /api/suggestions
async fn get_suggestions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SuggestionSet>>, ApiError> {
    match state.engine.get_suggestions().await? {
        Some(set) => Ok(Json(ApiResponse::ok("Suggestions retrieved", set))),
        None => Ok(Json(ApiResponse::ok_empty("No suggestions stored"))),
    }
}

/// PUT /api/suggestions
async fn put_suggestions(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(payload): Json<SuggestionsPayload>,
) -> Result<Json<ApiResponse<SuggestionSet>>, ApiError> {
    let set = state.engine.put_suggestions(payload.suggestions).await?;
    tracing::info!(subject = %identity.subject, "suggestions replaced");
    Ok(Json(ApiResponse::ok("Suggestions saved", set)))
}

/// DELETE /api/suggestions
async fn delete_suggestions(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state.engine.delete_suggestions().await?;
    tracing::info!(subject = %identity.subject, "suggestions cleared");
    Ok(Json(ApiResponse::ok_empty("Suggestions cleared")))
}

/// Creates the API router.
///
/// Every `/api/*` route is wrapped by the authorization gate; `/health`
/// stays public for probes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration for browser-based clients
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let protected = Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/api/suggestions",
            get(get_suggestions).put(put_suggestions).delete(delete_suggestions),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
