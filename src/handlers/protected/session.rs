use axum::Extension;

use crate::auth::VerifiedIdentity;
use crate::middleware::ApiResponse;

/// GET /api/auth/whoami - the identity established from the caller's credential
pub async fn whoami(Extension(identity): Extension<VerifiedIdentity>) -> ApiResponse<VerifiedIdentity> {
    ApiResponse::success(identity)
}
