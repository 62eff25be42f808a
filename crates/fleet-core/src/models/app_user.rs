//! Application user (subject) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppUser {
    pub id: Uuid,
    /// External identifier, usually an email address. Unique among live users.
    pub iam_email: String,
    /// Email on record, when the identity provider disclosed one.
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_superadmin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateAppUser {
    pub iam_email: String,
    pub email: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub is_superadmin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAppUser {
    pub display_name: Option<String>,
    pub is_superadmin: Option<bool>,
}
