//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Fleet entities go through the
//! single descriptor-driven [`EntityStore`]; every call on it carries the
//! tenant so implementations can enforce row-level isolation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::context::TenantId;
use crate::entity::{BulkOutcome, EntityDescriptor, EntityKey, EntityRecord, Fields};
use crate::error::FleetResult;
use crate::models::{
    app_user::{AppUser, CreateAppUser, UpdateAppUser},
    invitation::{CreateInvitation, Invitation, InvitationStatus},
    membership::{CreateUserOrganization, UpdateUserOrganization, UserOrganization},
    oauth_account::{CachedTokens, CreateOAuthAccount, OAuthAccount, Provider},
    organization::{CreateOrganization, Organization, OrganizationWithOwner, UpdateOrganization},
};
use crate::pagination::Pagination;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub trait AppUserRepository: Send + Sync {
    fn create(&self, input: CreateAppUser) -> impl Future<Output = FleetResult<AppUser>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FleetResult<AppUser>> + Send;
    fn get_by_iam_email(
        &self,
        iam_email: &str,
    ) -> impl Future<Output = FleetResult<AppUser>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAppUser,
    ) -> impl Future<Output = FleetResult<AppUser>> + Send;
    /// Soft delete; the user disappears from every lookup.
    fn delete(&self, id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<Vec<AppUser>>> + Send;
}

pub trait OAuthAccountRepository: Send + Sync {
    fn create(
        &self,
        app_user_id: Uuid,
        input: CreateOAuthAccount,
    ) -> impl Future<Output = FleetResult<OAuthAccount>> + Send;

    /// Create a user and its first linkage atomically. Either both rows
    /// exist afterwards or neither does.
    fn create_with_user(
        &self,
        user: CreateAppUser,
        account: CreateOAuthAccount,
    ) -> impl Future<Output = FleetResult<(AppUser, OAuthAccount)>> + Send;

    fn get_by_provider_user(
        &self,
        provider: Provider,
        provider_user_id: &str,
    ) -> impl Future<Output = FleetResult<OAuthAccount>> + Send;
    fn list_by_user(
        &self,
        app_user_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<OAuthAccount>>> + Send;
    fn update_tokens(
        &self,
        id: Uuid,
        tokens: CachedTokens,
    ) -> impl Future<Output = FleetResult<OAuthAccount>> + Send;
    fn delete_by_user(&self, app_user_id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Organizations & membership
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = FleetResult<Organization>> + Send;

    /// Create an organization and an `owner` membership marked as the
    /// user's default, in one transaction.
    fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner: Uuid,
    ) -> impl Future<Output = FleetResult<OrganizationWithOwner>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FleetResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = FleetResult<Organization>> + Send;
    /// Soft delete.
    fn delete(&self, id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<Vec<Organization>>> + Send;
}

pub trait MembershipRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the pair is already linked.
    fn create(
        &self,
        input: CreateUserOrganization,
    ) -> impl Future<Output = FleetResult<UserOrganization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FleetResult<UserOrganization>> + Send;
    fn get_by_user_and_organization(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> impl Future<Output = FleetResult<UserOrganization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUserOrganization,
    ) -> impl Future<Output = FleetResult<UserOrganization>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = FleetResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<Vec<UserOrganization>>> + Send;
    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<UserOrganization>>> + Send;
    fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = FleetResult<Vec<UserOrganization>>> + Send;
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

pub trait InvitationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateInvitation,
    ) -> impl Future<Output = FleetResult<Invitation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FleetResult<Invitation>> + Send;
    fn get_by_token(&self, token: &str) -> impl Future<Output = FleetResult<Invitation>> + Send;

    /// The pending, unexpired invitation for `(organization, email)`.
    fn get_pending(
        &self,
        organization_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = FleetResult<Invitation>> + Send;

    /// Accept an invitation and create the resulting membership in one
    /// transaction. Fails with the matching
    /// [`InvitationError`](crate::error::InvitationError) sentinel when the
    /// user is already a member, the invitation is no longer pending, or it
    /// has expired at `now`.
    fn accept(
        &self,
        id: Uuid,
        accepted_by: Uuid,
        now: DateTime<Utc>,
    ) -> impl Future<Output = FleetResult<(Invitation, UserOrganization)>> + Send;

    /// Move a pending invitation to `cancelled`.
    fn cancel(&self, id: Uuid) -> impl Future<Output = FleetResult<Invitation>> + Send;

    /// Rotate the token and extend the expiry of a pending or expired
    /// invitation, leaving it pending.
    fn resend(
        &self,
        id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = FleetResult<Invitation>> + Send;

    /// Newest first.
    fn list(
        &self,
        organization_id: Uuid,
        status: Option<InvitationStatus>,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<Vec<Invitation>>> + Send;
}

// ---------------------------------------------------------------------------
// Fleet entities
// ---------------------------------------------------------------------------

/// Storage for every descriptor-defined entity.
///
/// Rows are addressed by `(tenant, key)`. A row belonging to another tenant
/// is indistinguishable from a missing one.
pub trait EntityStore: Send + Sync {
    /// Insert a new row. `fields` already carries the key and the tenant.
    /// Fails with `AlreadyExists` when the key or the entity's unique field
    /// collides with a live row.
    fn create(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        fields: Fields,
    ) -> impl Future<Output = FleetResult<EntityRecord>> + Send;

    /// Soft-deleted rows are not returned.
    fn get(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
    ) -> impl Future<Output = FleetResult<EntityRecord>> + Send;

    /// Replace the stored payload.
    fn update(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
        fields: Fields,
    ) -> impl Future<Output = FleetResult<EntityRecord>> + Send;

    /// Physical delete, or a server-timestamped soft delete when the
    /// descriptor declares one.
    fn delete(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
    ) -> impl Future<Output = FleetResult<()>> + Send;

    /// Live rows in creation order.
    fn list(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        pagination: Pagination,
    ) -> impl Future<Output = FleetResult<Vec<EntityRecord>>> + Send;

    /// Look a row up by the descriptor's unique field.
    fn find_unique(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        value: &Value,
    ) -> impl Future<Output = FleetResult<EntityRecord>> + Send;

    /// Insert many rows, skipping those whose unique field is taken.
    fn bulk_create(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        rows: Vec<Fields>,
    ) -> impl Future<Output = FleetResult<BulkOutcome>> + Send;
}
