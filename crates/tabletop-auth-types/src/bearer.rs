//! `Authorization: Bearer <token>` parsing.

use axum_extra::headers::authorization::{Authorization, Bearer};
use axum_extra::headers::HeaderMapExt;
use http::HeaderMap;

/// Extract the bearer token from request headers.
///
/// Returns `None` when the header is absent, uses another scheme, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_owned())
        .filter(|token| !token.is_empty())
}
