//! Authorization gate middleware.
//!
//! A request-pipeline stage wrapping protected routes. It extracts the
//! bearer token (header must be exactly `Bearer <token>`), applies the
//! token verifier, and either attaches the resulting
//! [`AuthenticatedIdentity`] to the request or short-circuits with 401.
//!
//! The 401 body is `{error, details?}` where `error` is the stable
//! failure code. Which claim or key mismatched is logged internally and
//! never returned — the gate must not act as an oracle.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cakewalk_authn::{AuthError, AuthenticatedIdentity};
use serde::Serialize;

use crate::AppState;

/// 401 body: the stable failure code plus optional, non-sensitive detail.
#[derive(Debug, Serialize)]
pub struct UnauthorizedBody {
    /// Stable failure code.
    pub error: String,
    /// Non-sensitive hint, present only where it cannot leak anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Middleware applying the token verifier to protected routes.
///
/// On success the [`AuthenticatedIdentity`] is inserted into the request
/// extensions and the pipeline continues. The gate is idempotent and has
/// no side effects beyond the verifier's key-cache refresh.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("request without usable bearer token");
        return unauthorized(&AuthError::NoToken);
    };

    match state.verifier.verify(token).await {
        Ok(identity) => {
            request.extensions_mut().insert::<AuthenticatedIdentity>(identity);
            next.run(request).await
        },
        Err(err) => {
            // Full sub-reason stays in the logs only
            tracing::warn!(code = err.code(), error = %err, "rejected bearer token");
            unauthorized(&err)
        },
    }
}

/// Extracts the token from an exact `Bearer <token>` authorization header.
///
/// Absence, a different scheme, extra whitespace, or an empty token all
/// yield `None` — the verifier is never invoked for those.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() || token.starts_with(' ') {
        return None;
    }
    Some(token)
}

fn unauthorized(err: &AuthError) -> Response {
    let details = match err {
        AuthError::NoToken => Some("expected 'Authorization: Bearer <token>'".to_string()),
        _ => None,
    };
    let body = UnauthorizedBody { error: err.code().to_string(), details };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::HeaderValue;
    use rstest::rstest;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_no_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[rstest]
    #[case::wrong_scheme("Token abc")]
    #[case::lowercase_scheme("bearer abc")]
    #[case::no_space("Bearerabc")]
    #[case::empty_token("Bearer ")]
    #[case::double_space("Bearer  abc")]
    #[case::scheme_only("Bearer")]
    fn test_malformed_authorization_rejected(#[case] value: &str) {
        let headers = headers_with(value);
        assert_eq!(bearer_token(&headers), None, "value {value:?} must not yield a token");
    }

    #[test]
    fn test_unauthorized_body_has_code_only() {
        let response = unauthorized(&AuthError::SignatureInvalid);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
