//! Invitation engine: idempotent creation, token acceptance, cancel and
//! resend.
//!
//! Stored state only moves through the repository; `expired` is derived at
//! read time, so every invitation returned here has its status evaluated
//! against the current clock.

use chrono::{DateTime, Duration, Utc};
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::invitation::{CreateInvitation, DEFAULT_ROLE, Invitation, InvitationStatus};
use fleet_core::models::membership::UserOrganization;
use fleet_core::models::organization::Organization;
use fleet_core::pagination::Pagination;
use fleet_core::repository::{InvitationRepository, OrganizationRepository};
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::token::generate_invitation_token;

/// Page size for [`InvitationService::list`] when none is given.
pub const DEFAULT_LIST_LIMIT: i64 = 10;
/// Largest page [`InvitationService::list`] returns.
pub const MAX_LIST_LIMIT: i64 = 100;

fn observed(mut invitation: Invitation, now: DateTime<Utc>) -> Invitation {
    invitation.status = invitation.effective_status(now);
    invitation
}

pub struct InvitationService<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    invitations: I,
    organizations: O,
    config: AuthConfig,
}

impl<I, O> InvitationService<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    pub fn new(invitations: I, organizations: O, config: AuthConfig) -> Self {
        Self {
            invitations,
            organizations,
            config,
        }
    }

    /// Link handed to the invitee.
    pub fn invite_url(&self, invitation: &Invitation) -> String {
        self.config.invite_url(&invitation.token)
    }

    /// Invite `email` into `organization_id`.
    ///
    /// While a pending invitation for the same address exists it is
    /// returned unchanged, so retries never mint a second token.
    pub async fn create(
        &self,
        organization_id: Uuid,
        email: &str,
        role: &str,
        invited_by: Uuid,
    ) -> FleetResult<Invitation> {
        let email = email.trim();
        if email.is_empty() {
            return Err(FleetError::required("email"));
        }
        self.organizations.get_by_id(organization_id).await?;

        let now = Utc::now();
        match self
            .invitations
            .get_pending(organization_id, email, now)
            .await
        {
            Ok(existing) => return Ok(observed(existing, now)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let role = if role.is_empty() { DEFAULT_ROLE } else { role };
        let invitation = self
            .invitations
            .create(CreateInvitation {
                organization_id,
                email: email.to_string(),
                role: role.to_string(),
                token: generate_invitation_token(),
                invited_by,
                expires_at: now + self.ttl(),
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            organization_id = %organization_id,
            role = %invitation.role,
            "invitation created"
        );
        Ok(observed(invitation, now))
    }

    pub async fn get(&self, id: Uuid) -> FleetResult<Invitation> {
        let invitation = self.invitations.get_by_id(id).await?;
        Ok(observed(invitation, Utc::now()))
    }

    /// Look an invitation up by its token, together with the organization
    /// it grants access to.
    pub async fn get_by_token(&self, token: &str) -> FleetResult<(Invitation, Organization)> {
        if token.is_empty() {
            return Err(FleetError::required("token"));
        }
        let invitation = self.invitations.get_by_token(token).await?;
        let organization = self
            .organizations
            .get_by_id(invitation.organization_id)
            .await?;
        Ok((observed(invitation, Utc::now()), organization))
    }

    /// Accept the invitation carrying `token` on behalf of `user_id`.
    ///
    /// The membership check, the state checks and the membership insert
    /// happen in one transaction; an already-member caller leaves the
    /// invitation pending.
    pub async fn accept(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> FleetResult<(Invitation, UserOrganization)> {
        if token.is_empty() {
            return Err(FleetError::required("token"));
        }
        let invitation = self.invitations.get_by_token(token).await?;
        let (invitation, membership) = self
            .invitations
            .accept(invitation.id, user_id, Utc::now())
            .await?;

        info!(
            invitation_id = %invitation.id,
            organization_id = %invitation.organization_id,
            user_id = %user_id,
            "invitation accepted"
        );
        Ok((invitation, membership))
    }

    pub async fn cancel(&self, id: Uuid) -> FleetResult<Invitation> {
        let invitation = self.invitations.cancel(id).await?;
        info!(invitation_id = %id, "invitation cancelled");
        Ok(invitation)
    }

    /// Rotate the token and restart the expiry window.
    pub async fn resend(&self, id: Uuid) -> FleetResult<Invitation> {
        let now = Utc::now();
        let invitation = self
            .invitations
            .resend(id, generate_invitation_token(), now + self.ttl())
            .await?;
        info!(invitation_id = %id, expires_at = %invitation.expires_at, "invitation resent");
        Ok(observed(invitation, now))
    }

    /// Newest first. A non-positive `limit` means the default page size;
    /// larger requests are capped.
    pub async fn list(
        &self,
        organization_id: Uuid,
        status: Option<InvitationStatus>,
        limit: i64,
        offset: i64,
    ) -> FleetResult<Vec<Invitation>> {
        let limit = if limit <= 0 {
            DEFAULT_LIST_LIMIT
        } else {
            limit.min(MAX_LIST_LIMIT)
        };
        let pagination = Pagination {
            offset: offset.max(0) as u64,
            limit: limit as u64,
        };
        let now = Utc::now();
        let invitations = self
            .invitations
            .list(organization_id, status, pagination)
            .await?;
        Ok(invitations
            .into_iter()
            .map(|invitation| observed(invitation, now))
            .collect())
    }

    fn ttl(&self) -> Duration {
        Duration::hours(self.config.invitation_ttl_hours as i64)
    }
}
