//! Tenancy and authentication layers driven as tower middleware.

use std::convert::Infallible;

use fleet_auth::{AuthConfig, TokenService};
use fleet_core::{CallContext, Principal};
use fleet_server::layers::{AuthLayer, TenancyLayer, call_layers};
use tonic::{Code, Status};
use tower::{Layer, ServiceExt, service_fn};

type Seen = Option<CallContext>;

/// Inner handler that echoes the context it was handed.
async fn echo(req: http::Request<()>) -> Result<http::Response<Seen>, Infallible> {
    Ok(http::Response::new(
        req.extensions().get::<CallContext>().cloned(),
    ))
}

fn request(path: &str, headers: &[(&str, &str)]) -> http::Request<()> {
    let mut builder = http::Request::builder()
        .uri(format!("http://localhost{path}"))
        .header("content-type", "application/grpc")
        .header("te", "trailers");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(()).unwrap()
}

fn rejection(response: &http::Response<Seen>) -> Option<Status> {
    Status::from_header_map(response.headers())
}

fn config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "layer-secret".into(),
        ..AuthConfig::default()
    }
}

fn principal() -> Principal {
    Principal {
        user_id: "6f1c8f5e-2a8d-4a55-8a57-3f0e4b4f1c2d".into(),
        email: "driver@example.com".into(),
        display_name: "Driver".into(),
        is_superadmin: false,
    }
}

#[tokio::test]
async fn tenant_reaches_the_handler() {
    let svc = TenancyLayer.layer(service_fn(echo));
    let response = svc
        .oneshot(request(
            "/fleet.UriageService/GetUriage",
            &[("x-organization-id", "org-a")],
        ))
        .await
        .unwrap();

    assert!(rejection(&response).is_none());
    let ctx = response.into_body().unwrap();
    assert_eq!(ctx.tenant().unwrap().as_str(), "org-a");
}

#[tokio::test]
async fn missing_tenant_never_reaches_the_handler() {
    let svc = TenancyLayer.layer(service_fn(echo));
    let response = svc
        .oneshot(request("/fleet.UriageService/GetUriage", &[]))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "missing metadata");
    assert!(response.into_body().is_none());
}

#[tokio::test]
async fn other_metadata_names_the_missing_header() {
    let svc = TenancyLayer.layer(service_fn(echo));
    let response = svc
        .oneshot(request(
            "/fleet.UriageService/GetUriage",
            &[("x-request-id", "r-1")],
        ))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.message(), "missing x-organization-id header");
}

#[tokio::test]
async fn exempt_service_passes_without_a_tenant() {
    let svc = TenancyLayer.layer(service_fn(echo));
    let response = svc
        .oneshot(request("/auth.AuthService/AuthWithGoogle", &[]))
        .await
        .unwrap();

    assert!(rejection(&response).is_none());
    assert!(response.into_body().is_none());
}

#[tokio::test]
async fn auth_rejects_anonymous_calls_when_required() {
    let svc = AuthLayer::new(TokenService::new(&config()), true).layer(service_fn(echo));
    let response = svc
        .oneshot(request("/organization.OrganizationService/ListOrganizations", &[]))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(status.message(), "missing authorization header");
}

#[tokio::test]
async fn both_layers_fill_one_context() {
    let tokens = TokenService::new(&config());
    let pair = tokens.issue(&principal()).unwrap();
    let svc = call_layers(tokens, true).service(service_fn(echo));

    let bearer = format!("Bearer {}", pair.access_token);
    let response = svc
        .oneshot(request(
            "/organization.InvitationService/CreateInvitation",
            &[("authorization", bearer.as_str()), ("x-organization-id", "org-a")],
        ))
        .await
        .unwrap();

    assert!(rejection(&response).is_none());
    let ctx = response.into_body().unwrap();
    assert_eq!(ctx.tenant().unwrap().as_str(), "org-a");
    assert_eq!(ctx.principal().unwrap(), &principal());
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let foreign = TokenService::new(&AuthConfig {
        jwt_secret: "someone-else".into(),
        ..AuthConfig::default()
    });
    let pair = foreign.issue(&principal()).unwrap();
    let svc = AuthLayer::new(TokenService::new(&config()), false).layer(service_fn(echo));

    let bearer = format!("Bearer {}", pair.access_token);
    let response = svc
        .oneshot(request(
            "/fleet.UriageService/GetUriage",
            &[("authorization", bearer.as_str())],
        ))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::Unauthenticated);
    assert!(status.message().starts_with("invalid token: "));
}

#[tokio::test]
async fn server_stack_reports_missing_metadata_before_auth() {
    let svc = call_layers(TokenService::new(&config()), true).service(service_fn(echo));
    let response = svc
        .oneshot(request("/fleet.CamFileService/GetCamFile", &[]))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "missing metadata");
    assert!(response.into_body().is_none());
}

#[tokio::test]
async fn server_stack_rejects_an_authenticated_call_without_a_tenant() {
    let tokens = TokenService::new(&config());
    let pair = tokens.issue(&principal()).unwrap();
    let svc = call_layers(tokens, true).service(service_fn(echo));

    let bearer = format!("Bearer {}", pair.access_token);
    let response = svc
        .oneshot(request(
            "/fleet.CamFileService/GetCamFile",
            &[("authorization", bearer.as_str())],
        ))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "missing x-organization-id header");
}

#[tokio::test]
async fn server_stack_still_requires_auth_with_a_tenant() {
    let svc = call_layers(TokenService::new(&config()), true).service(service_fn(echo));
    let response = svc
        .oneshot(request(
            "/fleet.CamFileService/GetCamFile",
            &[("x-organization-id", "org-a")],
        ))
        .await
        .unwrap();

    let status = rejection(&response).unwrap();
    assert_eq!(status.code(), Code::Unauthenticated);
}
