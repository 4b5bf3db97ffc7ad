//! Authentication error types.
//!
//! This module defines the failure taxonomy for token verification and key
//! resolution. Each [`AuthError`] variant corresponds to one stable wire
//! code (see [`AuthError::code`]); claim failures additionally carry a
//! [`ClaimViolation`] sub-reason for internal observability.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Token verification failures.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No bearer token was presented, or the authorization scheme was wrong.
    #[error("No bearer token presented")]
    NoToken,

    /// The token does not have the required three-segment structure.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token header segment could not be decoded or parsed, or names
    /// an algorithm that is never accepted.
    #[error("Malformed token header: {0}")]
    MalformedHeader(String),

    /// The signing key named by the token could not be resolved.
    ///
    /// Wraps the underlying [`ResolverError`] to preserve whether the key
    /// was unknown or the key-set fetch itself failed.
    #[error("Key resolution failed")]
    KeyResolutionFailed(#[source] ResolverError),

    /// The cryptographic signature did not verify under the pinned algorithm.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// A claim check failed. The sub-reason is internal-only; callers see
    /// the uniform `ClaimInvalid` code.
    #[error("Claim validation failed: {0}")]
    ClaimInvalid(#[source] ClaimViolation),
}

impl AuthError {
    /// Stable wire code for this failure, part of the API contract.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NoToken => "NoToken",
            AuthError::MalformedToken(_) => "MalformedToken",
            AuthError::MalformedHeader(_) => "MalformedHeader",
            AuthError::KeyResolutionFailed(_) => "KeyResolutionFailed",
            AuthError::SignatureInvalid => "SignatureInvalid",
            AuthError::ClaimInvalid(_) => "ClaimInvalid",
        }
    }

    /// Creates a [`AuthError::MalformedToken`] with the given detail.
    pub fn malformed_token(detail: impl Into<String>) -> Self {
        AuthError::MalformedToken(detail.into())
    }

    /// Creates a [`AuthError::MalformedHeader`] with the given detail.
    pub fn malformed_header(detail: impl Into<String>) -> Self {
        AuthError::MalformedHeader(detail.into())
    }
}

/// Sub-reasons for [`AuthError::ClaimInvalid`].
///
/// Callers and tests can distinguish these; the HTTP surface must not,
/// to avoid acting as a claim oracle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClaimViolation {
    /// The token's expiry (plus skew tolerance) is in the past.
    #[error("token expired at {expires_at} (now {now})")]
    Expired {
        /// Expiry from the `exp` claim, seconds since epoch.
        expires_at: i64,
        /// Verifier's current time, seconds since epoch.
        now: i64,
    },

    /// The token's not-before (minus skew tolerance) is in the future.
    #[error("token not valid before {not_before} (now {now})")]
    NotYetValid {
        /// Not-before from the `nbf` claim, seconds since epoch.
        not_before: i64,
        /// Verifier's current time, seconds since epoch.
        now: i64,
    },

    /// The `iss` claim does not equal the configured trusted issuer.
    #[error("issuer mismatch")]
    IssuerMismatch,

    /// The `aud` claim does not equal the configured expected audience.
    #[error("audience mismatch")]
    AudienceMismatch,

    /// A contractually required claim is absent or has the wrong type.
    #[error("missing or mistyped claim: {claim}")]
    Missing {
        /// Name of the offending claim.
        claim: String,
    },
}

/// Key resolution failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolverError {
    /// The key identifier is not present in the key set, even after a
    /// fresh fetch.
    #[error("Unknown signing key: {kid}")]
    UnknownKey {
        /// Key ID that could not be resolved.
        kid: String,
    },

    /// The key-set endpoint was unreachable or returned malformed data.
    ///
    /// This is a dependency failure, never conflated with an unknown key.
    #[error("Key set fetch failed")]
    KeyFetch(#[from] KeyFetchError),
}

impl ResolverError {
    /// Creates a [`ResolverError::UnknownKey`] for the given key ID.
    pub fn unknown_key(kid: impl Into<String>) -> Self {
        ResolverError::UnknownKey { kid: kid.into() }
    }
}

/// Failure to fetch or parse the remote key-set document.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct KeyFetchError {
    message: String,
}

impl KeyFetchError {
    /// Creates a new fetch error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
