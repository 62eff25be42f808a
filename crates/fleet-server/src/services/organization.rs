//! `organization.OrganizationService`.

use std::sync::Arc;

use fleet_auth::OrganizationService;
use fleet_core::CallContext;
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::organization::{CreateOrganization, UpdateOrganization};
use fleet_core::repository::OrganizationRepository;
use tonic::body::Body;

use super::{optional_caller_id, page_request, parse_id};
use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::organization::{
    CreateOrganizationRequest, ListOrganizationsResponse, Organization, UpdateOrganizationRequest,
};
use crate::wire::{IdRequest, PageRequest, SuccessResponse};

pub struct OrganizationApi<O: OrganizationRepository + Clone> {
    bootstrap: OrganizationService<O>,
    organizations: O,
}

impl<O: OrganizationRepository + Clone> OrganizationApi<O> {
    pub fn new(organizations: O) -> Self {
        Self {
            bootstrap: OrganizationService::new(organizations.clone()),
            organizations,
        }
    }

    /// An authenticated caller becomes owner of the new organization.
    pub async fn create_organization(
        &self,
        ctx: &CallContext,
        req: CreateOrganizationRequest,
    ) -> FleetResult<Organization> {
        let input = CreateOrganization {
            name: req.name,
            slug: None,
        };
        let (org, _) = self.bootstrap.create(input, optional_caller_id(ctx)?).await?;
        Ok(org.into())
    }

    pub async fn get_organization(
        &self,
        _ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<Organization> {
        let id = parse_id("id", &req.id)?;
        Ok(self.organizations.get_by_id(id).await?.into())
    }

    pub async fn update_organization(
        &self,
        _ctx: &CallContext,
        req: UpdateOrganizationRequest,
    ) -> FleetResult<Organization> {
        let id = parse_id("id", &req.id)?;
        if req.name.is_empty() {
            return Err(FleetError::required("name"));
        }
        if req.slug.is_empty() {
            return Err(FleetError::required("slug"));
        }
        let input = UpdateOrganization {
            name: req.name,
            slug: req.slug,
        };
        Ok(self.organizations.update(id, input).await?.into())
    }

    pub async fn delete_organization(
        &self,
        _ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<SuccessResponse> {
        let id = parse_id("id", &req.id)?;
        self.organizations.delete(id).await?;
        Ok(SuccessResponse { success: true })
    }

    pub async fn list_organizations(
        &self,
        _ctx: &CallContext,
        req: PageRequest,
    ) -> FleetResult<ListOrganizationsResponse> {
        let page = page_request(req.page_size, &req.page_token)?;
        let rows = self.organizations.list(page.probe()).await?;
        let page = page.finish(rows);
        Ok(ListOrganizationsResponse {
            organizations: page.items.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token,
        })
    }
}

impl<O> Dispatch for OrganizationApi<O>
where
    O: OrganizationRepository + Clone + 'static,
{
    const NAME: &'static str = "organization.OrganizationService";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        Some(match method {
            "CreateOrganization" => route!(self, req, create_organization),
            "GetOrganization" => route!(self, req, get_organization),
            "UpdateOrganization" => route!(self, req, update_organization),
            "DeleteOrganization" => route!(self, req, delete_organization),
            "ListOrganizations" => route!(self, req, list_organizations),
            _ => return None,
        })
    }
}
