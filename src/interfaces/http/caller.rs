use crate::application::auth::Caller;
use crate::error::LedgerError;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

pub const ROLE_HEADER: &str = "x-caller-role";
pub const ID_HEADER: &str = "x-caller-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}

/// Resolves the caller identity forwarded by the upstream authenticator.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, LedgerError> {
    match header(headers, ROLE_HEADER) {
        Some("instructor") => header(headers, ID_HEADER)
            .and_then(|id| id.parse().ok())
            .map(Caller::Instructor)
            .ok_or(LedgerError::Unauthenticated),
        Some("admin") => Ok(Caller::Admin),
        Some("payment-provider") => Ok(Caller::PaymentProvider),
        _ => Err(LedgerError::Unauthenticated),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)
    }
}
