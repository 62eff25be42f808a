//! `organization.UserOrganizationService`: memberships of users in
//! organizations.

use std::sync::Arc;

use fleet_core::CallContext;
use fleet_core::error::FleetResult;
use fleet_core::models::membership::{
    CreateUserOrganization, ROLE_MEMBER, UpdateUserOrganization,
};
use fleet_core::repository::MembershipRepository;
use tonic::body::Body;

use super::{page_request, parse_id};
use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::organization::{
    CreateUserOrganizationRequest, ListUserOrganizationsByOrgRequest,
    ListUserOrganizationsByUserRequest, ListUserOrganizationsResponse,
    UpdateUserOrganizationRequest, UserOrganization,
};
use crate::wire::{IdRequest, PageRequest, SuccessResponse};

pub struct MembershipApi<M: MembershipRepository> {
    memberships: M,
}

fn role_or_member(role: String) -> String {
    if role.is_empty() {
        ROLE_MEMBER.to_string()
    } else {
        role
    }
}

impl<M: MembershipRepository> MembershipApi<M> {
    pub fn new(memberships: M) -> Self {
        Self { memberships }
    }

    /// A second membership of the same pair is `ALREADY_EXISTS`.
    pub async fn create_user_organization(
        &self,
        _ctx: &CallContext,
        req: CreateUserOrganizationRequest,
    ) -> FleetResult<UserOrganization> {
        let input = CreateUserOrganization {
            user_id: parse_id("user_id", &req.user_id)?,
            organization_id: parse_id("organization_id", &req.organization_id)?,
            role: role_or_member(req.role),
            is_default: req.is_default,
        };
        Ok(self.memberships.create(input).await?.into())
    }

    pub async fn get_user_organization(
        &self,
        _ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<UserOrganization> {
        let id = parse_id("id", &req.id)?;
        Ok(self.memberships.get_by_id(id).await?.into())
    }

    pub async fn update_user_organization(
        &self,
        _ctx: &CallContext,
        req: UpdateUserOrganizationRequest,
    ) -> FleetResult<UserOrganization> {
        let id = parse_id("id", &req.id)?;
        let input = UpdateUserOrganization {
            role: role_or_member(req.role),
            is_default: req.is_default,
        };
        Ok(self.memberships.update(id, input).await?.into())
    }

    pub async fn delete_user_organization(
        &self,
        _ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<SuccessResponse> {
        let id = parse_id("id", &req.id)?;
        self.memberships.delete(id).await?;
        Ok(SuccessResponse { success: true })
    }

    pub async fn list_user_organizations(
        &self,
        _ctx: &CallContext,
        req: PageRequest,
    ) -> FleetResult<ListUserOrganizationsResponse> {
        let page = page_request(req.page_size, &req.page_token)?;
        let rows = self.memberships.list(page.probe()).await?;
        let page = page.finish(rows);
        Ok(ListUserOrganizationsResponse {
            user_organizations: page.items.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token,
        })
    }

    pub async fn list_user_organizations_by_user(
        &self,
        _ctx: &CallContext,
        req: ListUserOrganizationsByUserRequest,
    ) -> FleetResult<ListUserOrganizationsResponse> {
        let user_id = parse_id("user_id", &req.user_id)?;
        let rows = self.memberships.list_by_user(user_id).await?;
        Ok(ListUserOrganizationsResponse {
            user_organizations: rows.into_iter().map(Into::into).collect(),
            next_page_token: String::new(),
        })
    }

    pub async fn list_user_organizations_by_org(
        &self,
        _ctx: &CallContext,
        req: ListUserOrganizationsByOrgRequest,
    ) -> FleetResult<ListUserOrganizationsResponse> {
        let organization_id = parse_id("organization_id", &req.organization_id)?;
        let rows = self.memberships.list_by_organization(organization_id).await?;
        Ok(ListUserOrganizationsResponse {
            user_organizations: rows.into_iter().map(Into::into).collect(),
            next_page_token: String::new(),
        })
    }
}

impl<M: MembershipRepository + 'static> Dispatch for MembershipApi<M> {
    const NAME: &'static str = "organization.UserOrganizationService";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        Some(match method {
            "CreateUserOrganization" => route!(self, req, create_user_organization),
            "GetUserOrganization" => route!(self, req, get_user_organization),
            "UpdateUserOrganization" => route!(self, req, update_user_organization),
            "DeleteUserOrganization" => route!(self, req, delete_user_organization),
            "ListUserOrganizations" => route!(self, req, list_user_organizations),
            "ListUserOrganizationsByUser" => route!(self, req, list_user_organizations_by_user),
            "ListUserOrganizationsByOrg" => route!(self, req, list_user_organizations_by_org),
            _ => return None,
        })
    }
}
