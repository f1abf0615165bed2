use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use super::parse_id;
use crate::app::AppState;
use crate::auth::VerifiedIdentity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Pet, PetCreate};
use crate::services::{PetService, PhotoUpload};

/// Multipart field carrying the image
const PHOTO_FIELD: &str = "file";

/// GET /api/pets
pub async fn list_pets(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> ApiResult<Vec<Pet>> {
    let pets = PetService::new(state.store.as_ref()).list(&identity).await?;
    Ok(ApiResponse::success(pets))
}

/// POST /api/pets
pub async fn create_pet(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    payload: Result<Json<PetCreate>, JsonRejection>,
) -> ApiResult<Pet> {
    let Json(payload) = payload?;
    let pet = PetService::new(state.store.as_ref()).create(&identity, payload).await?;
    Ok(ApiResponse::created(pet))
}

/// GET /api/pets/:id
pub async fn get_pet(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Pet> {
    let pet = PetService::new(state.store.as_ref()).get(parse_id(&id)?, &identity).await?;
    Ok(ApiResponse::success(pet))
}

/// PUT /api/pets/:id
pub async fn update_pet(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Pet> {
    let pet_id = parse_id(&id)?;
    // Decoded by the service after the ownership check
    let pet = PetService::new(state.store.as_ref())
        .update(pet_id, &identity, &body)
        .await?;
    Ok(ApiResponse::success(pet))
}

/// DELETE /api/pets/:id
pub async fn delete_pet(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    PetService::new(state.store.as_ref())
        .delete(parse_id(&id)?, &identity)
        .await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/pets/upload_photo
///
/// Expects a multipart body with the image in a field named `file`.
/// Responds with the public URL the photo is served from.
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some(PhotoUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let url = PetService::new(state.store.as_ref())
        .upload_photo(&state.config.storage.pet_photos_bucket, &identity, upload)
        .await?;

    Ok(ApiResponse::success(json!({ "photo_url": url })))
}
