//! `organization.AppUserService`: administration of application users.

use std::sync::Arc;

use fleet_core::CallContext;
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::app_user::{CreateAppUser, UpdateAppUser};
use fleet_core::repository::AppUserRepository;
use tonic::body::Body;

use super::{page_request, parse_id};
use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::organization::{
    AppUser, CreateAppUserRequest, GetAppUserByIamEmailRequest, ListAppUsersResponse,
    UpdateAppUserRequest,
};
use crate::wire::{IdRequest, PageRequest, SuccessResponse};

pub struct AppUserApi<U: AppUserRepository> {
    users: U,
}

impl<U: AppUserRepository> AppUserApi<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    pub async fn create_app_user(
        &self,
        _ctx: &CallContext,
        req: CreateAppUserRequest,
    ) -> FleetResult<AppUser> {
        if req.iam_email.is_empty() {
            return Err(FleetError::required("iam_email"));
        }
        if req.display_name.is_empty() {
            return Err(FleetError::required("display_name"));
        }
        let input = CreateAppUser {
            iam_email: req.iam_email,
            display_name: req.display_name,
            is_superadmin: req.is_superadmin,
            ..CreateAppUser::default()
        };
        Ok(self.users.create(input).await?.into())
    }

    pub async fn get_app_user(&self, _ctx: &CallContext, req: IdRequest) -> FleetResult<AppUser> {
        let id = parse_id("id", &req.id)?;
        Ok(self.users.get_by_id(id).await?.into())
    }

    pub async fn get_app_user_by_iam_email(
        &self,
        _ctx: &CallContext,
        req: GetAppUserByIamEmailRequest,
    ) -> FleetResult<AppUser> {
        if req.iam_email.is_empty() {
            return Err(FleetError::required("iam_email"));
        }
        Ok(self.users.get_by_iam_email(&req.iam_email).await?.into())
    }

    pub async fn update_app_user(
        &self,
        _ctx: &CallContext,
        req: UpdateAppUserRequest,
    ) -> FleetResult<AppUser> {
        let id = parse_id("id", &req.id)?;
        if req.display_name.is_empty() {
            return Err(FleetError::required("display_name"));
        }
        let input = UpdateAppUser {
            display_name: Some(req.display_name),
            is_superadmin: Some(req.is_superadmin),
        };
        Ok(self.users.update(id, input).await?.into())
    }

    pub async fn delete_app_user(
        &self,
        _ctx: &CallContext,
        req: IdRequest,
    ) -> FleetResult<SuccessResponse> {
        let id = parse_id("id", &req.id)?;
        self.users.delete(id).await?;
        Ok(SuccessResponse { success: true })
    }

    pub async fn list_app_users(
        &self,
        _ctx: &CallContext,
        req: PageRequest,
    ) -> FleetResult<ListAppUsersResponse> {
        let page = page_request(req.page_size, &req.page_token)?;
        let rows = self.users.list(page.probe()).await?;
        let page = page.finish(rows);
        Ok(ListAppUsersResponse {
            app_users: page.items.into_iter().map(Into::into).collect(),
            next_page_token: page.next_page_token,
        })
    }
}

impl<U: AppUserRepository + 'static> Dispatch for AppUserApi<U> {
    const NAME: &'static str = "organization.AppUserService";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        Some(match method {
            "CreateAppUser" => route!(self, req, create_app_user),
            "GetAppUser" => route!(self, req, get_app_user),
            "GetAppUserByIamEmail" => route!(self, req, get_app_user_by_iam_email),
            "UpdateAppUser" => route!(self, req, update_app_user),
            "DeleteAppUser" => route!(self, req, delete_app_user),
            "ListAppUsers" => route!(self, req, list_app_users),
            _ => return None,
        })
    }
}
