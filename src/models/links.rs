//! Link DTOs.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A link as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /links` and `PUT /links/:id`.
///
/// Absent and null fields decode as empty strings and empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkCreate {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
}
