//! Bearer token authentication.
//!
//! Methods outside [`AUTH_EXEMPT`] need `authorization: Bearer <token>`
//! carrying a valid access token; its claims become the call's
//! [`Principal`](fleet_core::Principal). With `require_auth` off, a call
//! without the header proceeds anonymously, but a bad header is still
//! rejected.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fleet_auth::TokenService;
use fleet_core::{CallContext, Principal};
use http::HeaderMap;
use tonic::Status;
use tracing::debug;

pub const AUTH_EXEMPT: &[&str] = &[
    "/grpc.health.v1.Health/",
    "/grpc.reflection.v1alpha.ServerReflection/",
    "/grpc.reflection.v1.ServerReflection/",
    "/auth.AuthService/",
];

const BEARER: &str = "Bearer ";

/// Principal of a call to `path`; `None` for exempt or anonymous calls.
pub fn authenticate(
    tokens: &TokenService,
    require_auth: bool,
    path: &str,
    headers: &HeaderMap,
) -> Result<Option<Principal>, Status> {
    if AUTH_EXEMPT.iter().any(|prefix| path.starts_with(prefix)) {
        return Ok(None);
    }

    let Some(value) = headers.get(http::header::AUTHORIZATION) else {
        if require_auth {
            return Err(Status::unauthenticated("missing authorization header"));
        }
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER))
        .ok_or_else(|| Status::unauthenticated("invalid authorization format"))?;

    let claims = tokens
        .verify_access(token)
        .map_err(|e| Status::unauthenticated(format!("invalid token: {e}")))?;
    Ok(Some(claims.into_principal()))
}

#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenService>,
    require_auth: bool,
}

impl AuthLayer {
    pub fn new(tokens: TokenService, require_auth: bool) -> Self {
        Self {
            tokens: Arc::new(tokens),
            require_auth,
        }
    }
}

impl<S> tower::Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            tokens: Arc::clone(&self.tokens),
            require_auth: self.require_auth,
        }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    tokens: Arc<TokenService>,
    require_auth: bool,
}

impl<S, ReqBody, ResBody> tower::Service<http::Request<ReqBody>> for AuthService<S>
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
        let outcome = authenticate(
            &self.tokens,
            self.require_auth,
            request.uri().path(),
            request.headers(),
        );
        match outcome {
            Ok(Some(principal)) => {
                let ctx = request
                    .extensions()
                    .get::<CallContext>()
                    .cloned()
                    .unwrap_or_default()
                    .with_principal(principal);
                request.extensions_mut().insert(ctx);
            }
            Ok(None) => {}
            Err(status) => {
                debug!(
                    method = request.uri().path(),
                    reason = status.message(),
                    "authentication rejected call"
                );
                return Box::pin(async move { Ok(status.into_http()) });
            }
        }
        Box::pin(self.inner.call(request))
    }
}
