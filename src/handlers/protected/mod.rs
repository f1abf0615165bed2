// Protected endpoints: every handler here runs behind `jwt_auth_middleware`
// and reads the caller from the `VerifiedIdentity` request extension.
pub mod pets;
pub mod profiles;
pub mod session;

pub use session::whoami;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id, rejecting anything that is not a UUID
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}
