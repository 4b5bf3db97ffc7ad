//! Token verification pipeline.
//!
//! [`TokenVerifier::verify`] takes a raw bearer token through five stages,
//! each with its own failure code:
//!
//! 1. **Structure** — exactly three non-empty dot-separated segments
//!    ([`AuthError::MalformedToken`])
//! 2. **Header** — base64 decode (either alphabet, padding normalized) and
//!    parse; algorithm name screened against the forbidden/accepted lists
//!    ([`AuthError::MalformedHeader`])
//! 3. **Key resolution** — via [`KeyResolver`]
//!    ([`AuthError::KeyResolutionFailed`])
//! 4. **Signature** — verified under the pinned algorithm only; the header
//!    can never select the algorithm ([`AuthError::SignatureInvalid`])
//! 5. **Claims** — issuer, audience, and validity window with skew
//!    tolerance ([`AuthError::ClaimInvalid`] with internal sub-reasons)
//!
//! Success yields an [`AuthenticatedIdentity`] carrying all claims
//! verbatim. The verifier holds no per-call state; the only shared state
//! is the resolver's key cache.

use std::{collections::HashSet, sync::Arc, time::Duration};

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use cakewalk_storage::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    error::{AuthError, ClaimViolation},
    resolver::KeyResolver,
};

/// Algorithms that are never accepted, whatever the header claims.
///
/// - `none`: no signature at all (trivially forgeable)
/// - `HS256`/`HS384`/`HS512`: symmetric — a verifier-side secret would
///   double as a signing key
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Algorithm names the header may carry.
///
/// Only EdDSA (Ed25519) is supported end-to-end; the header value is
/// informational and verification always uses [`PINNED_ALGORITHM`].
pub const ACCEPTED_ALGORITHMS: &[&str] = &["EdDSA"];

/// The one algorithm signatures are verified under.
pub const PINNED_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Default clock-skew tolerance applied to both edges of the validity window.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(5);

/// Parsed token header.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHeader {
    /// Algorithm name as stated by the token. Screened, never trusted.
    pub alg: String,
    /// Key identifier used to resolve the verification key.
    pub kid: String,
    /// Token type, if stated.
    #[serde(default)]
    pub typ: Option<String>,
}

/// An authenticated caller, produced per request and never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    /// The `sub` claim.
    pub subject: String,
    /// The `iss` claim (equal to the configured trusted issuer).
    pub issuer: String,
    /// The `aud` claim (equal to the configured expected audience).
    pub audience: String,
    /// The `iat` claim.
    pub issued_at: DateTime<Utc>,
    /// The `exp` claim.
    pub expires_at: DateTime<Utc>,
    claims: Map<String, Value>,
}

impl AuthenticatedIdentity {
    /// All decoded claims, verbatim.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// A single claim by name, if present.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// A single string-typed claim by name, if present and a string.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

/// Verifier configuration: the trusted issuer, the expected audience, and
/// the skew tolerance.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Tokens must carry exactly this `iss` value.
    pub issuer: String,
    /// Tokens must carry exactly this `aud` value.
    pub audience: String,
    /// Tolerance applied to both edges of the validity window.
    pub clock_skew: Duration,
}

impl VerifierConfig {
    /// Creates a configuration with the default skew tolerance.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self { issuer: issuer.into(), audience: audience.into(), clock_skew: DEFAULT_CLOCK_SKEW }
    }

    /// Overrides the skew tolerance.
    #[must_use]
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }
}

/// Verifies raw bearer tokens into [`AuthenticatedIdentity`] values.
pub struct TokenVerifier {
    resolver: Arc<KeyResolver>,
    config: VerifierConfig,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Creates a verifier using the system clock.
    #[must_use]
    pub fn new(resolver: Arc<KeyResolver>, config: VerifierConfig) -> Self {
        Self { resolver, config, clock: Arc::new(SystemClock) }
    }

    /// Replaces the time source. Intended for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verifies a raw bearer token.
    ///
    /// # Errors
    ///
    /// One [`AuthError`] per failed pipeline stage; see the module docs.
    #[tracing::instrument(skip(self, raw_token))]
    pub async fn verify(&self, raw_token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let (header_segment, _, _) = split_token(raw_token)?;

        let header = decode_header(header_segment)?;
        validate_algorithm(&header.alg)?;

        let key = self
            .resolver
            .resolve(&header.kid)
            .await
            .map_err(AuthError::KeyResolutionFailed)?;

        let claims = verify_signature(raw_token, &key.decoding_key)?;

        let identity = self.validate_claims(claims)?;

        tracing::debug!(subject = %identity.subject, kid = %header.kid, "token verified");
        Ok(identity)
    }

    /// Validates issuer, audience, and the validity window, then builds
    /// the identity. Checks run against the injected clock with the
    /// configured skew applied to both window edges.
    fn validate_claims(&self, claims: Map<String, Value>) -> Result<AuthenticatedIdentity, AuthError> {
        let subject = require_str(&claims, "sub")?;
        let issuer = require_str(&claims, "iss")?;
        let audience = require_str(&claims, "aud")?;
        let issued_at = require_timestamp(&claims, "iat")?;
        let expires_at = require_timestamp(&claims, "exp")?;
        let not_before = match claims.get("nbf") {
            None => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                AuthError::ClaimInvalid(ClaimViolation::Missing { claim: "nbf".into() })
            })?),
        };

        if issuer != self.config.issuer {
            return Err(AuthError::ClaimInvalid(ClaimViolation::IssuerMismatch));
        }
        if audience != self.config.audience {
            return Err(AuthError::ClaimInvalid(ClaimViolation::AudienceMismatch));
        }

        let now = self.clock.now().timestamp();
        let skew = self.config.clock_skew.as_secs() as i64;

        if let Some(not_before) = not_before {
            if now + skew < not_before {
                return Err(AuthError::ClaimInvalid(ClaimViolation::NotYetValid {
                    not_before,
                    now,
                }));
            }
        }
        if now - skew > expires_at {
            return Err(AuthError::ClaimInvalid(ClaimViolation::Expired { expires_at, now }));
        }

        let issued_at = DateTime::<Utc>::from_timestamp(issued_at, 0).ok_or_else(|| {
            AuthError::ClaimInvalid(ClaimViolation::Missing { claim: "iat".into() })
        })?;
        let expires_at = DateTime::<Utc>::from_timestamp(expires_at, 0).ok_or_else(|| {
            AuthError::ClaimInvalid(ClaimViolation::Missing { claim: "exp".into() })
        })?;

        Ok(AuthenticatedIdentity { subject, issuer, audience, issued_at, expires_at, claims })
    }
}

/// Splits a raw token into its three segments.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] unless there are exactly three
/// non-empty dot-separated segments.
pub fn split_token(raw_token: &str) -> Result<(&str, &str, &str), AuthError> {
    let mut segments = raw_token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::malformed_token("expected three dot-separated segments"));
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(AuthError::malformed_token("empty token segment"));
    }
    Ok((header, payload, signature))
}

/// Decodes a token segment, accepting both the URL-safe and the standard
/// base64 alphabets, with padding stripped first.
fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD.decode(trimmed).or_else(|_| STANDARD_NO_PAD.decode(trimmed))
}

/// Decodes and parses the header segment.
///
/// # Errors
///
/// Returns [`AuthError::MalformedHeader`] if the segment does not decode,
/// does not parse, or lacks a key identifier.
pub fn decode_header(header_segment: &str) -> Result<TokenHeader, AuthError> {
    let header_bytes = decode_segment(header_segment)
        .map_err(|e| AuthError::malformed_header(format!("base64 decode: {e}")))?;

    let header: TokenHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| AuthError::malformed_header(format!("header parse: {e}")))?;

    if header.kid.is_empty() {
        return Err(AuthError::malformed_header("empty key identifier"));
    }

    Ok(header)
}

/// Screens the algorithm *name* stated by a token header.
///
/// The stated algorithm never selects the verification algorithm — that is
/// always [`PINNED_ALGORITHM`] — but headers naming an algorithm this
/// service would never use are rejected up front.
///
/// # Errors
///
/// Returns [`AuthError::MalformedHeader`] for forbidden or unlisted names.
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::malformed_header(format!(
            "algorithm '{alg}' is not allowed for security reasons"
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::malformed_header(format!(
            "algorithm '{alg}' is not in the accepted list (only EdDSA is supported)"
        )));
    }

    Ok(())
}

/// Verifies the signature over header+payload under the pinned algorithm
/// and returns the decoded claims.
///
/// Claim checks are deliberately disabled here; they run separately with
/// the injected clock so each violation gets its own sub-reason.
fn verify_signature(token: &str, key: &DecodingKey) -> Result<Map<String, Value>, AuthError> {
    let mut validation = Validation::new(PINNED_ALGORITHM);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    let token_data =
        jsonwebtoken::decode::<Map<String, Value>>(token, key, &validation).map_err(map_jwt_error)?;

    Ok(token_data.claims)
}

/// Maps signature-stage library failures onto the verifier taxonomy.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::malformed_token(err.to_string())
        },
        ErrorKind::InvalidAlgorithm => {
            AuthError::malformed_header("token algorithm does not match the pinned algorithm")
        },
        _ => AuthError::SignatureInvalid,
    }
}

fn require_str(claims: &Map<String, Value>, name: &str) -> Result<String, AuthError> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AuthError::ClaimInvalid(ClaimViolation::Missing { claim: name.into() }))
}

fn require_timestamp(claims: &Map<String, Value>, name: &str) -> Result<i64, AuthError> {
    claims
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| AuthError::ClaimInvalid(ClaimViolation::Missing { claim: name.into() }))
}
