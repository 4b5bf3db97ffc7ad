//! Cakewalk catalog API server binary.

use std::sync::Arc;

use cakewalk_api::{create_router, ApiConfig, AppState};
use cakewalk_authn::{HttpKeySetFetcher, KeyResolver, TokenVerifier, VerifierConfig};
use cakewalk_catalog::CatalogEngine;
use cakewalk_storage::MemoryBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .init();

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        },
    };

    // Storage backend. In-memory for now; swap in a persistent
    // StorageBackend implementation here when one lands.
    let backend = Arc::new(MemoryBackend::new());
    let engine = Arc::new(CatalogEngine::new(backend));

    let fetcher = Arc::new(HttpKeySetFetcher::new(config.key_set_url.clone()));
    let resolver = Arc::new(KeyResolver::with_ttl(fetcher, config.key_ttl));
    let verifier = Arc::new(TokenVerifier::new(
        resolver,
        VerifierConfig::new(config.issuer.clone(), config.audience.clone())
            .with_clock_skew(config.clock_skew),
    ));

    info!(
        bind_addr = %config.bind_addr,
        key_set_url = %config.key_set_url,
        issuer = %config.issuer,
        audience = %config.audience,
        "starting cakewalk-api"
    );

    let app = create_router(AppState { engine, verifier });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("failed to bind listen address");

    axum::serve(listener, app).await.expect("server error");
}
