//! Per-resource ownership enforcement.
//!
//! Every single-resource read and every mutation goes through [`authorize`]
//! before the data store is asked to do anything else. Listing relies on an
//! `owner_id` filter instead and never reaches this module.
//!
//! A caller probing someone else's resource gets 403 while a caller probing
//! an unknown id gets 404, so existence of a resource id leaks to anyone
//! holding a valid credential. This matches the hosted API's behaviour and is
//! kept as an accepted tradeoff.

use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

use super::VerifiedIdentity;
use crate::store::StoreError;

/// A record that belongs to exactly one identity
pub trait Owned {
    fn owner_id(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Data store failure: {0}")]
    StoreFailure(#[from] StoreError),

    #[error("Resource not found")]
    NotFound,

    #[error("Resource belongs to another user")]
    Forbidden,
}

/// Load `resource_id` through `fetch_owner` and confirm `identity` owns it.
///
/// On success the fetched record is handed back so callers do not need a
/// second round-trip.
pub async fn authorize<R, F, Fut>(
    resource_id: &str,
    identity: &VerifiedIdentity,
    fetch_owner: F,
) -> Result<R, AuthzError>
where
    R: Owned,
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Option<R>, StoreError>>,
{
    let record = fetch_owner(resource_id.to_string())
        .await?
        .ok_or_else(|| {
            debug!("Ownership check: resource {} not found", resource_id);
            AuthzError::NotFound
        })?;

    if record.owner_id() != identity.id {
        warn!(
            "Ownership check failed: resource {} belongs to {}, requested by {}",
            resource_id,
            record.owner_id(),
            identity.id
        );
        return Err(AuthzError::Forbidden);
    }

    Ok(record)
}
