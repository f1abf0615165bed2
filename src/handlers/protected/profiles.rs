use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::VerifiedIdentity;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Profile, ProfileUpdate};
use crate::services::ProfileService;

/// GET /api/profiles/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Profile> {
    let profile = ProfileService::new(state.store.as_ref()).get(&identity).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profiles/me
pub async fn update_my_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Profile> {
    let Json(payload) = payload?;
    let profile = ProfileService::new(state.store.as_ref())
        .update(&identity, payload)
        .await?;
    Ok(ApiResponse::success(profile))
}
