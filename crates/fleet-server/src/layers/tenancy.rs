//! Tenant header enforcement.
//!
//! Every method outside [`TENANT_EXEMPT`] must carry `x-organization-id`.
//! The tenant is attached to the request's [`CallContext`]; rejected calls
//! never reach a handler.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use fleet_core::{CallContext, TenantId};
use http::HeaderMap;
use tonic::Status;
use tracing::debug;

pub const TENANT_HEADER: &str = "x-organization-id";

/// Method path prefixes that run without a tenant.
pub const TENANT_EXEMPT: &[&str] = &[
    "/grpc.health.v1.Health/",
    "/grpc.reflection.v1alpha.ServerReflection/",
    "/grpc.reflection.v1.ServerReflection/",
    "/auth.AuthService/",
    "/organization.OrganizationService/",
    "/organization.AppUserService/",
    "/organization.UserOrganizationService/",
];

/// Headers every gRPC call carries regardless of caller metadata.
const TRANSPORT_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "te",
    "host",
    "user-agent",
    "accept-encoding",
    "grpc-timeout",
    "grpc-encoding",
    "grpc-accept-encoding",
];

/// Tenant of a call to `path`, or `None` for exempt methods.
pub fn extract_tenant(path: &str, headers: &HeaderMap) -> Result<Option<TenantId>, Status> {
    if TENANT_EXEMPT.iter().any(|prefix| path.starts_with(prefix)) {
        return Ok(None);
    }

    let Some(value) = headers.get(TENANT_HEADER) else {
        let has_metadata = headers
            .keys()
            .any(|name| !TRANSPORT_HEADERS.contains(&name.as_str()));
        return Err(if has_metadata {
            Status::invalid_argument("missing x-organization-id header")
        } else {
            Status::invalid_argument("missing metadata")
        });
    };

    let value = value
        .to_str()
        .map_err(|_| Status::invalid_argument("x-organization-id is not valid ASCII"))?;
    TenantId::new(value)
        .map(Some)
        .ok_or_else(|| Status::invalid_argument("x-organization-id cannot be empty"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TenancyLayer;

impl<S> tower::Layer<S> for TenancyLayer {
    type Service = TenancyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenancyService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TenancyService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> tower::Service<http::Request<ReqBody>> for TenancyService<S>
where
    S: tower::Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = http::Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<ReqBody>) -> Self::Future {
        match extract_tenant(request.uri().path(), request.headers()) {
            Ok(Some(tenant)) => {
                let ctx = request
                    .extensions()
                    .get::<CallContext>()
                    .cloned()
                    .unwrap_or_default()
                    .with_tenant(tenant);
                request.extensions_mut().insert(ctx);
            }
            Ok(None) => {}
            Err(status) => {
                debug!(
                    method = request.uri().path(),
                    reason = status.message(),
                    "tenancy check rejected call"
                );
                return Box::pin(async move { Ok(status.into_http()) });
            }
        }
        Box::pin(self.inner.call(request))
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use tonic::Code;

    use super::*;

    const GET_CAM_FILE: &str = "/fleet.CamFileService/GetCamFile";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn exempt_methods_need_no_header() {
        for path in [
            "/grpc.health.v1.Health/Check",
            "/auth.AuthService/AuthWithGoogle",
            "/organization.OrganizationService/CreateOrganization",
            "/organization.AppUserService/GetAppUser",
            "/organization.UserOrganizationService/ListUserOrganizations",
            "/grpc.reflection.v1.ServerReflection/ServerReflectionInfo",
        ] {
            assert_eq!(extract_tenant(path, &HeaderMap::new()).unwrap(), None);
        }
    }

    #[test]
    fn invitations_are_tenanted() {
        let err = extract_tenant(
            "/organization.InvitationService/CreateInvitation",
            &HeaderMap::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[test]
    fn no_caller_metadata_at_all() {
        let transport = headers(&[("content-type", "application/grpc"), ("te", "trailers")]);
        let err = extract_tenant(GET_CAM_FILE, &transport).unwrap_err();
        assert_eq!(err.message(), "missing metadata");
    }

    #[test]
    fn other_metadata_without_the_tenant() {
        let map = headers(&[("content-type", "application/grpc"), ("x-request-id", "r1")]);
        let err = extract_tenant(GET_CAM_FILE, &map).unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "missing x-organization-id header");
    }

    #[test]
    fn empty_tenant_is_rejected() {
        let err = extract_tenant(GET_CAM_FILE, &headers(&[(TENANT_HEADER, "")])).unwrap_err();
        assert_eq!(err.message(), "x-organization-id cannot be empty");
    }

    #[test]
    fn tenant_is_returned() {
        let tenant = extract_tenant(GET_CAM_FILE, &headers(&[(TENANT_HEADER, "org-42")]))
            .unwrap()
            .unwrap();
        assert_eq!(tenant.as_str(), "org-42");
    }

    #[test]
    fn prefix_match_needs_the_trailing_slash() {
        let err = extract_tenant("/auth.AuthServiceAdmin/Do", &HeaderMap::new()).unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }
}
