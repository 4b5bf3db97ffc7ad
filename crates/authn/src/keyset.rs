//! Key-set document types and key material handling.
//!
//! The identity provider publishes its signing keys as a JSON key-set
//! document (`{"keys": [...]}`). This module parses that document and
//! converts each usable entry into a [`SigningKey`] ready for signature
//! verification.
//!
//! Only Ed25519 OKP keys are usable; other entries are reported to the
//! caller via [`Jwk::to_signing_key`] and skipped by the resolver.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// A parsed key-set document as published by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySet {
    /// The signing keys, in document order.
    pub keys: Vec<Jwk>,
}

impl KeySet {
    /// Creates an empty key set.
    #[must_use]
    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }
}

/// A single key entry in the key-set document.
///
/// Fields beyond `kty` and `kid` are optional so that documents carrying
/// key types this service does not use still parse; unusable entries are
/// rejected at conversion time, not at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, e.g. `"OKP"`.
    pub kty: String,
    /// Key identifier; tokens reference keys by this value.
    pub kid: String,
    /// Curve name for OKP keys, e.g. `"Ed25519"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Base64url-encoded (no padding) public key bytes for OKP keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Advertised algorithm, e.g. `"EdDSA"`. Informational only — the
    /// verifier pins its own algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Advertised key use, e.g. `"sig"`.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl Jwk {
    /// Converts this document entry into a usable [`SigningKey`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] if the entry is not an Ed25519 OKP key
    /// or its public key material is malformed.
    pub fn to_signing_key(&self) -> Result<SigningKey, InvalidKeyError> {
        if self.kty != "OKP" {
            return Err(InvalidKeyError(format!("unsupported key type '{}'", self.kty)));
        }
        match self.crv.as_deref() {
            Some("Ed25519") => {},
            Some(other) => {
                return Err(InvalidKeyError(format!("unsupported curve '{other}'")));
            },
            None => return Err(InvalidKeyError("missing curve".into())),
        }
        let x = self
            .x
            .as_deref()
            .ok_or_else(|| InvalidKeyError("missing public key component".into()))?;

        let decoding_key = to_decoding_key(x)?;

        Ok(SigningKey { kid: self.kid.clone(), decoding_key: Arc::new(decoding_key) })
    }
}

/// A resolved signing key: key identifier plus verification key material.
///
/// Immutable once built; the resolver replaces its whole key map on each
/// refresh rather than mutating entries.
#[derive(Clone)]
pub struct SigningKey {
    /// Key identifier from the key-set document.
    pub kid: String,
    /// Verification key for the pinned algorithm.
    pub decoding_key: Arc<DecodingKey>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately not printed.
        f.debug_struct("SigningKey").field("kid", &self.kid).finish_non_exhaustive()
    }
}

/// Reason a key-set entry could not be converted into a [`SigningKey`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidKeyError(String);

/// Converts a base64url-encoded Ed25519 public key into a [`DecodingKey`].
fn to_decoding_key(public_key_b64: &str) -> Result<DecodingKey, InvalidKeyError> {
    // Decode into a Zeroizing wrapper so the raw key bytes are scrubbed
    // from memory when dropped.
    let public_key_bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
        URL_SAFE_NO_PAD
            .decode(public_key_b64.as_bytes())
            .map_err(|e| InvalidKeyError(format!("base64 decode: {e}")))?,
    );

    // Ed25519 public keys are exactly 32 bytes
    if public_key_bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(InvalidKeyError(format!(
            "expected {PUBLIC_KEY_LENGTH} bytes, got {}",
            public_key_bytes.len()
        )));
    }

    let key_bytes: Zeroizing<[u8; PUBLIC_KEY_LENGTH]> = Zeroizing::new(
        public_key_bytes[..PUBLIC_KEY_LENGTH]
            .try_into()
            .map_err(|_| InvalidKeyError("failed to convert bytes".into()))?,
    );

    // Validate it's a real curve point before accepting it
    let _verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| InvalidKeyError(format!("invalid Ed25519 key: {e}")))?;

    drop(key_bytes);
    drop(public_key_bytes);

    DecodingKey::from_ed_components(public_key_b64)
        .map_err(|e| InvalidKeyError(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::testutil::{generate_test_keypair, test_jwk};

    #[test]
    fn test_valid_okp_key_converts() {
        let (_, public_key_b64) = generate_test_keypair();
        let jwk = test_jwk("key-001", &public_key_b64);

        let key = jwk.to_signing_key().unwrap();
        assert_eq!(key.kid, "key-001");
    }

    #[rstest]
    #[case::rsa_kty("RSA", Some("Ed25519"), "unsupported key type")]
    #[case::wrong_curve("OKP", Some("P-256"), "unsupported curve")]
    #[case::no_curve("OKP", None, "missing curve")]
    fn test_unusable_entries_rejected(
        #[case] kty: &str,
        #[case] crv: Option<&str>,
        #[case] expected: &str,
    ) {
        let (_, public_key_b64) = generate_test_keypair();
        let mut jwk = test_jwk("key-002", &public_key_b64);
        jwk.kty = kty.to_string();
        jwk.crv = crv.map(str::to_string);

        let err = jwk.to_signing_key().unwrap_err();
        assert!(err.to_string().contains(expected), "got: {err}");
    }

    #[rstest]
    #[case::invalid_base64("not-valid!!!")]
    #[case::wrong_length("AAAA")]
    fn test_bad_key_material_rejected(#[case] bad_x: &str) {
        let mut jwk = test_jwk("key-003", bad_x);
        jwk.x = Some(bad_x.to_string());

        assert!(jwk.to_signing_key().is_err());
    }

    #[test]
    fn test_missing_x_rejected() {
        let (_, public_key_b64) = generate_test_keypair();
        let mut jwk = test_jwk("key-004", &public_key_b64);
        jwk.x = None;

        let err = jwk.to_signing_key().unwrap_err();
        assert!(err.to_string().contains("missing public key component"));
    }

    #[test]
    fn test_key_set_document_round_trip() {
        let (_, public_key_b64) = generate_test_keypair();
        let key_set = KeySet { keys: vec![test_jwk("key-005", &public_key_b64)] };

        let json = serde_json::to_string(&key_set).unwrap();
        let parsed: KeySet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.keys.len(), 1);
        assert_eq!(parsed.keys[0].kid, "key-005");
    }

    #[test]
    fn test_foreign_key_types_still_parse() {
        // An RSA entry in the document must parse (and only fail at
        // conversion), so one foreign key cannot poison the whole set.
        let doc = r#"{"keys":[{"kty":"RSA","kid":"rsa-1","n":"abc","e":"AQAB"}]}"#;
        let parsed: KeySet = serde_json::from_str(doc).unwrap();
        assert_eq!(parsed.keys.len(), 1);
        assert!(parsed.keys[0].to_signing_key().is_err());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let (_, public_key_b64) = generate_test_keypair();
        let key = test_jwk("key-006", &public_key_b64).to_signing_key().unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("key-006"));
        assert!(!rendered.contains(&public_key_b64));
    }
}
