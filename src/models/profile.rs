use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::{double_option, finish_validation, FieldErrors};
use crate::auth::Owned;
use crate::error::ApiError;
use crate::store::Row;

/// A row of the `profiles` table. Its id is the auth subject of its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Owned for Profile {
    fn owner_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "double_option")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        for (field, value) in [("avatar_url", &self.avatar_url), ("website", &self.website)] {
            if let Some(Some(raw)) = value {
                if !raw.is_empty() && !is_http_url(raw) {
                    errors.insert(field.to_string(), "must be an http(s) URL".to_string());
                }
            }
        }
        finish_validation(errors, "Invalid profile data")
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.full_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.avatar_url.is_none()
            && self.website.is_none()
    }

    /// Patch containing the supplied fields plus a fresh `updated_at`
    pub fn into_patch(self, now: DateTime<Utc>) -> Row {
        let mut patch = Row::new();
        let fields = [
            ("username", self.username),
            ("full_name", self.full_name),
            ("phone", self.phone),
            ("address", self.address),
            ("avatar_url", self.avatar_url),
            ("website", self.website),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                patch.insert(name.to_string(), json!(value));
            }
        }
        if !patch.is_empty() {
            patch.insert("updated_at".to_string(), json!(now));
        }
        patch
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
