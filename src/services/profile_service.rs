use chrono::Utc;
use tracing::{debug, info};

use crate::auth::{authorize, VerifiedIdentity};
use crate::error::ApiError;
use crate::models::{from_row, Profile, ProfileUpdate};
use crate::store::{DataStore, Filter, StoreError};

pub const PROFILES_TABLE: &str = "profiles";

/// Operations on the profile of the calling identity
pub struct ProfileService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ProfileService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    async fn find(&self, profile_id: &str) -> Result<Option<Profile>, StoreError> {
        let rows = self
            .store
            .select(PROFILES_TABLE, &Filter::new().eq("id", profile_id))
            .await?;
        rows.into_iter().next().map(from_row::<Profile>).transpose()
    }

    async fn owned(&self, identity: &VerifiedIdentity) -> Result<Profile, ApiError> {
        // Profiles are created by the platform on sign-up, keyed by the subject
        if identity.user_uuid().is_none() {
            return Err(ApiError::unauthorized("Invalid user identifier"));
        }

        authorize(&identity.id, identity, |id| async move { self.find(&id).await })
            .await
            .map_err(|err| match ApiError::from(err) {
                ApiError::NotFound(_) => ApiError::not_found("Profile not found"),
                other => other,
            })
    }

    pub async fn get(&self, identity: &VerifiedIdentity) -> Result<Profile, ApiError> {
        let profile = self.owned(identity).await?;
        debug!("Loaded profile {}", profile.id);
        Ok(profile)
    }

    pub async fn update(&self, identity: &VerifiedIdentity, payload: ProfileUpdate) -> Result<Profile, ApiError> {
        let profile = self.owned(identity).await?;
        if payload.is_empty() {
            return Err(ApiError::bad_request("No data provided for update"));
        }
        payload.validate()?;

        let row = self
            .store
            .update(PROFILES_TABLE, &profile.id, payload.into_patch(Utc::now()))
            .await?
            .ok_or_else(|| ApiError::not_found("Profile not found for update"))?;
        info!("Updated profile {}", profile.id);
        Ok(from_row(row)?)
    }
}
