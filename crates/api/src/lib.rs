//! # Cakewalk API
//!
//! HTTP surface for the Cakewalk catalog service.
//!
//! This crate wires the pieces together:
//! - **[`auth`]**: the authorization gate — a middleware stage that applies
//!   the token verifier to protected routes and short-circuits with 401
//! - **[`routes`]**: the router and handlers delegating to the catalog
//!   engine
//! - **[`response`]**: the `{success, message, data?, error?, timestamp}`
//!   envelope and the error-to-status mapping
//! - **[`config`]**: environment-driven process configuration
//!
//! The binary (`src/main.rs`) assembles backend, engine, resolver, and
//! verifier, then serves the router.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use cakewalk_authn::TokenVerifier;
use cakewalk_catalog::CatalogEngine;

/// Authorization gate middleware.
pub mod auth;
/// Environment-driven configuration.
pub mod config;
/// Response envelope and error mapping.
pub mod response;
/// Router and handlers.
pub mod routes;

pub use config::{ApiConfig, ConfigError};
pub use routes::create_router;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Catalog integrity engine.
    pub engine: Arc<CatalogEngine>,
    /// Bearer token verifier.
    pub verifier: Arc<TokenVerifier>,
}
