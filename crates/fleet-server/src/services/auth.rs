//! `auth.AuthService`: OAuth login, token refresh and introspection.

use std::sync::Arc;

use fleet_auth::oauth::OAuthProvider;
use fleet_auth::{AuthService, LoginOutput};
use fleet_core::CallContext;
use fleet_core::error::FleetResult;
use fleet_core::models::oauth_account::Provider;
use fleet_core::repository::{AppUserRepository, OAuthAccountRepository};
use tonic::body::Body;

use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::auth::{
    AuthResponse, AuthWithCodeRequest, GetAuthUrlRequest, GetAuthUrlResponse, RefreshTokenRequest,
    ValidateTokenRequest, ValidateTokenResponse,
};

pub struct AuthApi<U, O, P>
where
    U: AppUserRepository,
    O: OAuthAccountRepository,
    P: OAuthProvider,
{
    auth: Arc<AuthService<U, O, P>>,
}

impl<U, O, P> AuthApi<U, O, P>
where
    U: AppUserRepository,
    O: OAuthAccountRepository,
    P: OAuthProvider,
{
    pub fn new(auth: Arc<AuthService<U, O, P>>) -> Self {
        Self { auth }
    }

    pub async fn get_auth_url(
        &self,
        _ctx: &CallContext,
        req: GetAuthUrlRequest,
    ) -> FleetResult<GetAuthUrlResponse> {
        let url = self.auth.get_auth_url(&req.provider, &req.state)?;
        Ok(GetAuthUrlResponse { url })
    }

    pub async fn auth_with_google(
        &self,
        _ctx: &CallContext,
        req: AuthWithCodeRequest,
    ) -> FleetResult<AuthResponse> {
        let output = self.auth.login(Provider::Google, &req.code).await?;
        Ok(auth_response(output))
    }

    pub async fn auth_with_line(
        &self,
        _ctx: &CallContext,
        req: AuthWithCodeRequest,
    ) -> FleetResult<AuthResponse> {
        let output = self.auth.login(Provider::Line, &req.code).await?;
        Ok(auth_response(output))
    }

    pub async fn refresh_token(
        &self,
        _ctx: &CallContext,
        req: RefreshTokenRequest,
    ) -> FleetResult<AuthResponse> {
        let output = self.auth.refresh_token(&req.refresh_token).await?;
        Ok(auth_response(output))
    }

    pub async fn validate_token(
        &self,
        _ctx: &CallContext,
        req: ValidateTokenRequest,
    ) -> FleetResult<ValidateTokenResponse> {
        let user = self.auth.validate_token(&req.access_token).await?;
        Ok(ValidateTokenResponse {
            valid: user.is_some(),
            user: user.map(Into::into),
        })
    }
}

fn auth_response(output: LoginOutput) -> AuthResponse {
    AuthResponse {
        access_token: output.tokens.access_token,
        refresh_token: output.tokens.refresh_token,
        expires_in: output.tokens.expires_in,
        user: Some(output.user.into()),
    }
}

impl<U, O, P> Dispatch for AuthApi<U, O, P>
where
    U: AppUserRepository + 'static,
    O: OAuthAccountRepository + 'static,
    P: OAuthProvider + 'static,
{
    const NAME: &'static str = "auth.AuthService";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        Some(match method {
            "GetAuthURL" => route!(self, req, get_auth_url),
            "AuthWithGoogle" => route!(self, req, auth_with_google),
            "AuthWithLine" => route!(self, req, auth_with_line),
            "RefreshToken" => route!(self, req, refresh_token),
            "ValidateToken" => route!(self, req, validate_token),
            _ => return None,
        })
    }
}
