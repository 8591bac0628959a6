//! Principal extraction middleware.
//!
//! Token verification happens at the gateway; downstream services trust the
//! `x-principal` header it forwards after validating the bearer token. This
//! middleware parses that header into a [`Principal`] and attaches it to the
//! request extensions, rejecting requests that carry none.

use axum::{
    body::Body,
    http::{header::HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::models::Principal;

/// Header carrying the gateway-verified principal as JSON.
pub static PRINCIPAL_HEADER: HeaderName = HeaderName::from_static("x-principal");

/// Attaches the authenticated [`Principal`] to the request.
///
/// # Errors
/// Returns [`AppError::Unauthorized`] when the header is missing or not
/// valid principal JSON. Authorization (role/department checks) is left to
/// the services themselves.
pub async fn principal_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req
        .headers()
        .get(&PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| serde_json::from_str::<Principal>(v).ok())
        .ok_or(AppError::Unauthorized)?;

    tracing::debug!(user = %principal.name, role = %principal.role, "principal attached");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Extract the bearer token from the Authorization header.
pub fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
