use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{authorize, VerifiedIdentity};
use crate::error::ApiError;
use crate::models::{from_row, parse_json_body, Pet, PetCreate, PetUpdate};
use crate::store::{DataStore, Filter, StoreError};

pub const PETS_TABLE: &str = "pets";

/// An image received from a client, ready to be stored
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Operations on the pets of the calling identity
pub struct PetService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> PetService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    async fn find(&self, pet_id: &str) -> Result<Option<Pet>, StoreError> {
        let rows = self
            .store
            .select(PETS_TABLE, &Filter::new().eq("id", pet_id))
            .await?;
        rows.into_iter().next().map(from_row::<Pet>).transpose()
    }

    /// Fetch a pet and confirm it belongs to `identity`
    async fn owned(&self, pet_id: Uuid, identity: &VerifiedIdentity) -> Result<Pet, ApiError> {
        let pet = authorize(&pet_id.to_string(), identity, |id| async move {
            self.find(&id).await
        })
        .await?;
        Ok(pet)
    }

    /// Pets whose `owner_id` is the caller; the store applies the filter
    pub async fn list(&self, identity: &VerifiedIdentity) -> Result<Vec<Pet>, ApiError> {
        let rows = self
            .store
            .select(PETS_TABLE, &Filter::new().eq("owner_id", identity.id.as_str()))
            .await?;

        let pets = rows
            .into_iter()
            .map(from_row::<Pet>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Found {} pets for owner {}", pets.len(), identity.id);
        Ok(pets)
    }

    pub async fn create(&self, identity: &VerifiedIdentity, payload: PetCreate) -> Result<Pet, ApiError> {
        // owner_id must equal the subject exactly, not its canonical UUID form
        if identity.user_uuid().is_none() {
            return Err(ApiError::unauthorized("Invalid user identifier"));
        }
        payload.validate()?;

        let row = self
            .store
            .insert(PETS_TABLE, payload.into_row(&identity.id))
            .await?;
        let pet: Pet = from_row(row)?;
        info!("Created pet {} for owner {}", pet.id, pet.owner_id);
        Ok(pet)
    }

    pub async fn get(&self, pet_id: Uuid, identity: &VerifiedIdentity) -> Result<Pet, ApiError> {
        self.owned(pet_id, identity).await
    }

    /// Apply a JSON patch body. The body is only decoded once the caller is
    /// known to own the pet.
    pub async fn update(&self, pet_id: Uuid, identity: &VerifiedIdentity, body: &[u8]) -> Result<Pet, ApiError> {
        self.owned(pet_id, identity).await?;
        let payload: PetUpdate = parse_json_body(body)?;
        payload.validate()?;

        let patch = payload.into_patch();
        if patch.is_empty() {
            return Err(ApiError::bad_request("No data provided for update"));
        }

        let row = self
            .store
            .update(PETS_TABLE, &pet_id.to_string(), patch)
            .await?
            .ok_or_else(|| {
                warn!("Pet {} vanished between ownership check and update", pet_id);
                ApiError::not_found(format!("Pet {} not found", pet_id))
            })?;
        info!("Updated pet {}", pet_id);
        Ok(from_row(row)?)
    }

    pub async fn delete(&self, pet_id: Uuid, identity: &VerifiedIdentity) -> Result<(), ApiError> {
        self.owned(pet_id, identity).await?;
        self.store.delete(PETS_TABLE, &pet_id.to_string()).await?;
        info!("Deleted pet {}", pet_id);
        Ok(())
    }

    /// Store a pet photo under the caller's folder and return its public URL
    pub async fn upload_photo(
        &self,
        bucket: &str,
        identity: &VerifiedIdentity,
        upload: PhotoUpload,
    ) -> Result<String, ApiError> {
        let content_type = match upload.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct.to_string(),
            other => {
                warn!("Rejected non-image upload with content type {:?}", other);
                return Err(ApiError::bad_request("File type not allowed. Only images are accepted."));
            }
        };

        let path = photo_path(&identity.id, upload.file_name.as_deref());
        debug!("Uploading {} bytes to {}/{}", upload.bytes.len(), bucket, path);

        let url = self
            .store
            .upload_blob(bucket, &path, upload.bytes, &content_type)
            .await?;
        info!("Stored pet photo for {} at {}", identity.id, url);
        Ok(url)
    }
}

/// `user_<id>/<uuid>.<ext>`, extension taken from the client file name
fn photo_path(owner_id: &str, file_name: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg");

    format!("user_{}/{}.{}", owner_id, Uuid::new_v4(), extension.to_ascii_lowercase())
}
