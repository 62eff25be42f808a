//! `organization.InvitationService`.
//!
//! Invitations are scoped to the caller's tenant, except the lookups by
//! token: holding the token is what grants access to the invitation.

use std::sync::Arc;

use fleet_auth::InvitationService;
use fleet_core::CallContext;
use fleet_core::entity::ensure_same_tenant;
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::invitation::{Invitation, InvitationStatus};
use fleet_core::repository::{InvitationRepository, OrganizationRepository};
use serde_json::Value;
use tonic::body::Body;
use uuid::Uuid;

use super::{caller_id, parse_id};
use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::convert;
use crate::wire::organization::{
    AcceptInvitationResponse, CreateInvitationRequest, GetInvitationByTokenResponse,
    GetInvitationResponse, InvitationWithUrl, ListInvitationsRequest, ListInvitationsResponse,
    TokenRequest,
};
use crate::wire::{IdRequest, SuccessResponse};

pub struct InvitationApi<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    invitations: InvitationService<I, O>,
}

/// Organization an invitation call targets: the tenant, which a
/// non-empty `requested` id must match.
fn target_organization(ctx: &CallContext, requested: &str) -> FleetResult<Uuid> {
    let tenant = ctx.require_tenant()?;
    ensure_same_tenant(tenant, Some(&Value::String(requested.to_string())))?;
    parse_id("x-organization-id", tenant.as_str())
}

impl<I, O> InvitationApi<I, O>
where
    I: InvitationRepository,
    O: OrganizationRepository,
{
    pub fn new(invitations: InvitationService<I, O>) -> Self {
        Self { invitations }
    }

    fn to_wire(&self, invitation: Invitation) -> crate::wire::organization::Invitation {
        let url = self.invitations.invite_url(&invitation);
        convert::invitation(invitation, url)
    }

    /// Invitation `id`, provided it belongs to the caller's tenant.
    async fn in_tenant(&self, ctx: &CallContext, id: &str) -> FleetResult<Invitation> {
        let organization_id = target_organization(ctx, "")?;
        let id = parse_id("id", id)?;
        let invitation = self.invitations.get(id).await?;
        if invitation.organization_id != organization_id {
            return Err(FleetError::not_found("invitation", id.to_string()));
        }
        Ok(invitation)
    }

    pub async fn create_invitation(
        &self,
        ctx: &CallContext,
        req: CreateInvitationRequest,
    ) -> FleetResult<InvitationWithUrl> {
        let invited_by = caller_id(ctx)?;
        let organization_id = target_organization(ctx, &req.organization_id)?;
        let invitation = self
            .invitations
            .create(organization_id, &req.email, &req.role, invited_by)
            .await?;

        let invite_url = self.invitations.invite_url(&invitation);
        Ok(InvitationWithUrl {
            invitation: Some(convert::invitation(invitation, invite_url.clone())),
            invite_url,
        })
    }

    pub async fn get_invitation(
        &self,
        ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<GetInvitationResponse> {
        let invitation = self.in_tenant(ctx, &req.id).await?;
        Ok(GetInvitationResponse {
            invitation: Some(self.to_wire(invitation)),
        })
    }

    pub async fn get_invitation_by_token(
        &self,
        _ctx: &CallContext,
        req: TokenRequest,
    ) -> FleetResult<GetInvitationByTokenResponse> {
        let (invitation, organization) = self.invitations.get_by_token(&req.token).await?;
        Ok(GetInvitationByTokenResponse {
            invitation: Some(self.to_wire(invitation)),
            organization: Some(organization.into()),
        })
    }

    pub async fn accept_invitation(
        &self,
        ctx: &CallContext,
        req: TokenRequest,
    ) -> FleetResult<AcceptInvitationResponse> {
        let user_id = caller_id(ctx)?;
        let (_, membership) = self.invitations.accept(&req.token, user_id).await?;
        Ok(AcceptInvitationResponse {
            success: true,
            user_organization: Some(membership.into()),
        })
    }

    pub async fn cancel_invitation(
        &self,
        ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<SuccessResponse> {
        caller_id(ctx)?;
        let invitation = self.in_tenant(ctx, &req.id).await?;
        self.invitations.cancel(invitation.id).await?;
        Ok(SuccessResponse { success: true })
    }

    pub async fn resend_invitation(
        &self,
        ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<InvitationWithUrl> {
        let invitation = self.in_tenant(ctx, &req.id).await?;
        let invitation = self.invitations.resend(invitation.id).await?;

        let invite_url = self.invitations.invite_url(&invitation);
        Ok(InvitationWithUrl {
            invitation: Some(convert::invitation(invitation, invite_url.clone())),
            invite_url,
        })
    }

    pub async fn list_invitations(
        &self,
        ctx: &CallContext,
        req: ListInvitationsRequest,
    ) -> FleetResult<ListInvitationsResponse> {
        let organization_id = target_organization(ctx, &req.organization_id)?;
        let status = match req.status.as_str() {
            "" => None,
            s => Some(s.parse::<InvitationStatus>()?),
        };
        let invitations = self
            .invitations
            .list(organization_id, status, req.limit.into(), req.offset.into())
            .await?;
        Ok(ListInvitationsResponse {
            invitations: invitations
                .into_iter()
                .map(|invitation| self.to_wire(invitation))
                .collect(),
        })
    }
}

impl<I, O> Dispatch for InvitationApi<I, O>
where
    I: InvitationRepository + 'static,
    O: OrganizationRepository + 'static,
{
    const NAME: &'static str = "organization.InvitationService";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        Some(match method {
            "CreateInvitation" => route!(self, req, create_invitation),
            "GetInvitation" => route!(self, req, get_invitation),
            "GetInvitationByToken" => route!(self, req, get_invitation_by_token),
            "AcceptInvitation" => route!(self, req, accept_invitation),
            "CancelInvitation" => route!(self, req, cancel_invitation),
            "ResendInvitation" => route!(self, req, resend_invitation),
            "ListInvitations" => route!(self, req, list_invitations),
            _ => return None,
        })
    }
}
