pub mod pet;
pub mod profile;

pub use pet::{Pet, PetCreate, PetUpdate};
pub use profile::{Profile, ProfileUpdate};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ApiError;
use crate::store::{Row, StoreError};

/// Field name -> problem description
pub type FieldErrors = HashMap<String, String>;

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Decode a platform row into a typed record
pub(crate) fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| StoreError::UnexpectedResponse(format!("row does not match model: {}", e)))
}

/// Decode a request body that was buffered instead of extracted with `Json`
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        if e.is_data() {
            ApiError::invalid_json(format!("Failed to deserialize the JSON body into the target type: {}", e))
        } else {
            ApiError::invalid_json(format!("Failed to parse the request body as JSON: {}", e))
        }
    })
}

pub(crate) fn check_length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min {
        errors.insert(field.to_string(), format!("must be at least {} characters", min));
    } else if len > max {
        errors.insert(field.to_string(), format!("must be at most {} characters", max));
    }
}

pub(crate) fn finish_validation(errors: FieldErrors, message: &str) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(message, Some(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_body_errors_are_invalid_json() {
        let err = parse_json_body::<PetUpdate>(br#"{"birthdate": "x"}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");

        let err = parse_json_body::<PetUpdate>(b"{not json").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_JSON");

        let update = parse_json_body::<PetUpdate>(br#"{"name": "Max"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Max"));
    }
}
