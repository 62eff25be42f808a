//! Organization model.
//!
//! Organizations are the tenancy scope: every fleet entity row and every
//! invitation belongs to exactly one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::membership::UserOrganization;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    /// Assigned automatically when `None`.
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
    pub slug: String,
}

/// An organization created together with its first owner.
#[derive(Debug, Clone)]
pub struct OrganizationWithOwner {
    pub organization: Organization,
    pub owner: UserOrganization,
}
