use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::NrcError;
use crate::router::NrcState;

pub const ADMIN_KEY_HEADER: &str = "x-nrc-key";

fn key_matches(candidate: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Check the admin key against the request.
/// Accepts either:
/// - Header: `x-nrc-key: ...`
/// - Header: `Authorization: Bearer ...`
/// - Query string: `?key=...`
///
/// An empty configured key rejects everything.
pub fn ensure_admin(
    headers: &HeaderMap,
    bearer: Option<&str>,
    query: Option<&str>,
    expected: &str,
) -> Result<(), NrcError> {
    if let Some(hv) = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok())
        && key_matches(hv.trim(), expected)
    {
        return Ok(());
    }

    if let Some(token) = bearer
        && key_matches(token, expected)
    {
        return Ok(());
    }

    if let Some(qs) = query {
        for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
            if k == "key" && key_matches(&v, expected) {
                return Ok(());
            }
        }
    }

    Err(NrcError::Unauthorized)
}

/// Extractor guarding the admin-only routes.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<NrcState> for RequireAdmin {
    type Rejection = NrcError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &NrcState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(auth)| auth.token().to_string());
        let result = ensure_admin(
            &parts.headers,
            bearer.as_deref(),
            parts.uri.query(),
            &state.admin_key,
        );
        if result.is_err() {
            warn!(path = %parts.uri.path(), "admin key rejected");
        }
        result.map(|()| Self)
    }
}
