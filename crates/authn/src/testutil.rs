//! Shared test utilities for authentication testing.
//!
//! This module provides helpers for generating Ed25519 key pairs, minting
//! signed tokens, crafting raw token strings (for attack testing), and
//! substituting the fetch/clock seams. It is gated behind the `testutil`
//! feature to keep it out of production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cakewalk-authn = { path = "../authn", features = ["testutil"] }
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::SigningKey as DalekSigningKey;
use jsonwebtoken::{EncodingKey, Header};
use parking_lot::Mutex;
use rand_core::OsRng;
use serde_json::json;
use zeroize::Zeroizing;

pub use cakewalk_storage::testutil::ManualClock;

use crate::{
    error::KeyFetchError,
    keyset::{Jwk, KeySet},
    resolver::KeySetFetcher,
    verifier::PINNED_ALGORITHM,
};

/// Generates a test Ed25519 key pair.
///
/// Returns `(pkcs8_der, public_key_base64url)` where:
/// - `pkcs8_der` is the private key in PKCS#8 DER format wrapped in [`Zeroizing`] (suitable for
///   [`EncodingKey::from_ed_der`])
/// - `public_key_base64url` is the 32-byte public key encoded as base64url without padding
///   (suitable for the `x` component of an OKP [`Jwk`])
///
/// Each call generates a fresh random key pair.
pub fn generate_test_keypair() -> (Zeroizing<Vec<u8>>, String) {
    let signing_key = DalekSigningKey::generate(&mut OsRng);
    let public_key_bytes = signing_key.verifying_key().to_bytes();
    let public_key_b64 = URL_SAFE_NO_PAD.encode(public_key_bytes);

    // Wrap intermediate private bytes in Zeroizing to scrub from memory on drop.
    let private_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes());
    let mut pkcs8_der = Zeroizing::new(vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // INTEGER version 0
        0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
        0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
        0x04, 0x22, // OCTET STRING, 34 bytes
        0x04, 0x20, // OCTET STRING, 32 bytes (the actual key)
    ]);
    pkcs8_der.extend_from_slice(&*private_bytes);

    (pkcs8_der, public_key_b64)
}

/// Builds an Ed25519 OKP [`Jwk`] entry for a key-set document.
pub fn test_jwk(kid: &str, public_key_b64: &str) -> Jwk {
    Jwk {
        kty: "OKP".into(),
        kid: kid.into(),
        crv: Some("Ed25519".into()),
        x: Some(public_key_b64.into()),
        alg: Some("EdDSA".into()),
        key_use: Some("sig".into()),
    }
}

/// Standard claims for a token valid one hour from `now` (epoch seconds).
///
/// Returns a JSON object suitable for [`mint_token`]; individual claims can
/// be overridden by index assignment before minting.
pub fn claims_for(issuer: &str, audience: &str, now: i64) -> serde_json::Value {
    json!({
        "iss": issuer,
        "sub": "user:test",
        "aud": audience,
        "exp": now + 3600,
        "iat": now,
        "scope": "catalog:read catalog:write",
    })
}

/// Mints a token signed with an Ed25519 key in PKCS#8 DER format.
///
/// The `kid` header is set so the verifier can look up the matching public
/// key.
///
/// # Panics
///
/// Panics if encoding fails (should not happen with valid inputs).
pub fn mint_token(pkcs8_der: &[u8], kid: &str, claims: &serde_json::Value) -> String {
    let mut header = Header::new(PINNED_ALGORITHM);
    header.kid = Some(kid.to_string());

    let encoding_key = EncodingKey::from_ed_der(pkcs8_der);
    jsonwebtoken::encode(&header, claims, &encoding_key).expect("Failed to encode test token")
}

/// Creates a raw token string from arbitrary header and payload JSON.
///
/// The resulting token has the structure `{header_b64}.{payload_b64}.{sig}`
/// with a placeholder signature. This is useful for testing rejection of
/// malformed or attack tokens (e.g. `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.c2ln")
}

/// A [`KeySetFetcher`] serving a mutable in-memory key set.
///
/// Supports failure injection and an artificial delay so tests can overlap
/// concurrent fetches deterministically. The resolver counts fetches
/// itself; [`calls`](Self::calls) additionally counts calls that reached
/// this fetcher.
pub struct StaticKeySetFetcher {
    key_set: Mutex<KeySet>,
    failure: Mutex<Option<String>>,
    delay: Option<Duration>,
    calls: AtomicU64,
}

impl StaticKeySetFetcher {
    /// Creates a fetcher serving the given key set.
    #[must_use]
    pub fn new(key_set: KeySet) -> Self {
        Self { key_set: Mutex::new(key_set), failure: Mutex::new(None), delay: None, calls: AtomicU64::new(0) }
    }

    /// Adds an artificial delay before each fetch completes.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replaces the served key set (simulates provider-side rotation).
    pub fn set_key_set(&self, key_set: KeySet) {
        *self.key_set.lock() = key_set;
    }

    /// Makes subsequent fetches fail with the given message (or succeed
    /// again when `None`).
    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    /// Number of fetch calls that reached this fetcher.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KeySetFetcher for StaticKeySetFetcher {
    async fn fetch_key_set(&self) -> Result<KeySet, KeyFetchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.failure.lock().clone() {
            return Err(KeyFetchError::new(message));
        }
        Ok(self.key_set.lock().clone())
    }
}

/// Asserts that a `Result<T, AuthError>` is an `Err` matching the given
/// [`AuthError`](crate::error::AuthError) variant.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use cakewalk_authn::assert_auth_error;
/// use cakewalk_authn::error::AuthError;
///
/// let result: Result<(), AuthError> = Err(AuthError::SignatureInvalid);
/// assert_auth_error!(result, SignatureInvalid);
/// ```
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "expected AuthError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::AuthError::$variant { .. })),
            "{}: expected AuthError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_test_keypair_produces_valid_key() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        // PKCS#8 DER for Ed25519 is 48 bytes (16 header + 32 key)
        assert_eq!(pkcs8_der.len(), 48);
        // Base64url of 32 bytes = 43 characters (no padding)
        assert_eq!(public_key_b64.len(), 43);
    }

    #[test]
    fn test_generate_test_keypair_unique() {
        let (_, pk1) = generate_test_keypair();
        let (_, pk2) = generate_test_keypair();
        assert_ne!(pk1, pk2, "each call should produce a unique key pair");
    }

    #[test]
    fn test_mint_token_produces_three_part_token() {
        let (pkcs8_der, _) = generate_test_keypair();
        let claims = claims_for("iss", "aud", 1_700_000_000);
        let token = mint_token(&pkcs8_der, "kid-001", &claims);
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "token should have header.payload.signature");
        assert!(!parts[2].is_empty(), "signature should not be empty");
    }

    #[test]
    fn test_craft_raw_jwt_format() {
        let header = json!({"alg": "none", "typ": "JWT"});
        let payload = json!({"sub": "test"});
        let token = craft_raw_jwt(&header, &payload);
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
    }

    #[tokio::test]
    async fn test_static_fetcher_failure_injection() {
        let fetcher = StaticKeySetFetcher::new(KeySet::empty());
        fetcher.set_failure(Some("boom".into()));
        assert!(fetcher.fetch_key_set().await.is_err());

        fetcher.set_failure(None);
        assert!(fetcher.fetch_key_set().await.is_ok());
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_assert_auth_error_macro() {
        use crate::error::AuthError;
        let result: Result<(), AuthError> = Err(AuthError::SignatureInvalid);
        assert_auth_error!(result, SignatureInvalid);

        let result: Result<(), AuthError> = Err(AuthError::malformed_token("x"));
        assert_auth_error!(result, MalformedToken, "structural failure expected");
    }
}
