use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;

/// Verifies the bearer credential and attaches the resulting
/// [`VerifiedIdentity`](crate::auth::VerifiedIdentity) to the request.
///
/// Every failure becomes a 401 with a `WWW-Authenticate: Bearer` challenge;
/// handlers behind this layer never run for unauthenticated callers.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers());

    let identity = state.verifier.verify(token).map_err(|err| {
        debug!("Rejected request to {}: {}", request.uri().path(), err);
        ApiError::from(err)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Raw token from an `Authorization: Bearer <token>` header.
///
/// Other schemes, non-ASCII header values and empty tokens count as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
