//! Customer identity domain.

mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};

/// Customer as saved on database.
///
/// The password hash is structurally excluded from every serialized
/// representation; no caller-facing shape ever carries credential
/// material.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Stored lowercased; uniqueness is case-insensitive.
    pub email: String,
    pub phone_number: String,
    #[serde(skip)]
    pub password: String,
    pub profile_picture: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// Presence-aware partial update of a [`Customer`].
///
/// `None` means "field not supplied, leave unchanged"; a supplied value is
/// applied as-is. Empty strings are rejected upstream by validation, so
/// there is no falsy-means-unchanged ambiguity.
#[derive(Debug, Default, Clone)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// When supplied, the credential is re-hashed; saving a record without
    /// a password change never re-hashes.
    pub password: Option<String>,
}
