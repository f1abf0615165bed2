use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{check_length, double_option, finish_validation, FieldErrors};
use crate::auth::Owned;
use crate::error::ApiError;
use crate::store::Row;

/// A pet as stored in the `pets` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Owned for Pet {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Body of `POST /pets`. Unknown fields, `owner_id` included, are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PetCreate {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl PetCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "name", &self.name, 1, 100);
        check_length(&mut errors, "species", &self.species, 1, 50);
        if let Some(breed) = &self.breed {
            check_length(&mut errors, "breed", breed, 0, 50);
        }
        if let Some(gender) = &self.gender {
            check_length(&mut errors, "gender", gender, 0, 20);
        }
        finish_validation(errors, "Invalid pet data")
    }

    /// Row to insert; the owner always comes from the verified identity
    pub fn into_row(self, owner_id: &str) -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(self.name));
        row.insert("species".into(), json!(self.species));
        row.insert("breed".into(), json!(self.breed));
        row.insert("birthdate".into(), json!(self.birthdate));
        row.insert("gender".into(), json!(self.gender));
        row.insert("photo_url".into(), json!(self.photo_url));
        row.insert("owner_id".into(), json!(owner_id));
        row
    }
}

/// Body of `PUT /pets/:id`; only fields present in the request are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub breed: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birthdate: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo_url: Option<Option<String>>,
}

impl PetUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            check_length(&mut errors, "name", name, 1, 100);
        }
        if let Some(species) = &self.species {
            check_length(&mut errors, "species", species, 1, 50);
        }
        if let Some(Some(breed)) = &self.breed {
            check_length(&mut errors, "breed", breed, 0, 50);
        }
        if let Some(Some(gender)) = &self.gender {
            check_length(&mut errors, "gender", gender, 0, 20);
        }
        finish_validation(errors, "Invalid pet data")
    }

    pub fn into_patch(self) -> Row {
        let mut patch = Row::new();
        if let Some(name) = self.name {
            patch.insert("name".into(), json!(name));
        }
        if let Some(species) = self.species {
            patch.insert("species".into(), json!(species));
        }
        if let Some(breed) = self.breed {
            patch.insert("breed".into(), json!(breed));
        }
        if let Some(birthdate) = self.birthdate {
            patch.insert("birthdate".into(), json!(birthdate));
        }
        if let Some(gender) = self.gender {
            patch.insert("gender".into(), json!(gender));
        }
        if let Some(photo_url) = self.photo_url {
            patch.insert("photo_url".into(), json!(photo_url));
        }
        patch
    }
}
