//! # Cakewalk Authentication
//!
//! Bearer token verification for Cakewalk services.
//!
//! This crate provides:
//! - **[`KeyResolver`]**: TTL-cached resolution of signing keys from a remote key-set endpoint,
//!   with coalesced refreshes
//! - **[`TokenVerifier`]**: structural, cryptographic, and claim validation of bearer tokens
//! - **Failure taxonomy**: every rejection is a typed [`AuthError`] with a stable wire code
//!
//! ## Security posture
//!
//! - The verification algorithm is pinned to EdDSA (Ed25519); the algorithm
//!   named in a token header can never select it
//! - Symmetric algorithms (HS256, etc.) and `none` are explicitly rejected
//! - Claim failures carry distinct sub-reasons internally but callers surface
//!   only the uniform `ClaimInvalid` code
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cakewalk_authn::{HttpKeySetFetcher, KeyResolver, TokenVerifier, VerifierConfig};
//! use url::Url;
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpKeySetFetcher::new(Url::parse("https://id.example.com/keys")?);
//! let resolver = Arc::new(KeyResolver::new(Arc::new(fetcher)));
//! let verifier = TokenVerifier::new(
//!     resolver,
//!     VerifierConfig::new("https://id.example.com", "cakewalk-api"),
//! );
//!
//! let identity = verifier.verify(token).await?;
//! println!("authenticated subject: {}", identity.subject);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Authentication error types.
pub mod error;
/// Key-set document types and key material handling.
pub mod keyset;
/// Signing key resolution and caching.
pub mod resolver;
/// Token verification pipeline.
pub mod verifier;

/// Test helpers (key generation, token minting, fake fetchers).
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use cakewalk_storage::clock::{Clock, SystemClock};
pub use error::{AuthError, ClaimViolation, KeyFetchError, ResolverError, Result};
pub use keyset::{Jwk, KeySet, SigningKey};
pub use resolver::{HttpKeySetFetcher, KeyResolver, KeySetFetcher, DEFAULT_KEY_TTL};
pub use verifier::{
    AuthenticatedIdentity, TokenVerifier, VerifierConfig, ACCEPTED_ALGORITHMS,
    DEFAULT_CLOCK_SKEW, FORBIDDEN_ALGORITHMS, PINNED_ALGORITHM,
};
