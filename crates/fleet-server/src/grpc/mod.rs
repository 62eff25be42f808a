//! Unary gRPC plumbing shared by every service.
//!
//! Services implement [`Dispatch`], mapping a method name to a handler;
//! [`GrpcServer`] turns that into the `tower` service tonic routes to.

mod status;

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fleet_core::CallContext;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;

pub use status::status;

pub type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Handler future for one routed call.
pub type RouteFuture = BoxFuture<http::Response<Body>, Infallible>;

pub trait Dispatch: Send + Sync + 'static {
    /// Fully qualified service name, e.g. `organization.OrganizationService`.
    const NAME: &'static str;

    /// Start the handler for `method` (the path segment after the
    /// service), or `None` when the service has no such method.
    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture>;
}

/// Decode a unary request, run `handler` and encode its answer.
pub fn unary<T, Req, Resp, F, Fut>(inner: Arc<T>, req: http::Request<Body>, handler: F) -> RouteFuture
where
    T: Send + Sync + 'static,
    Req: prost::Message + Default + Send + 'static,
    Resp: prost::Message + Send + 'static,
    F: FnOnce(Arc<T>, Request<Req>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Response<Resp>, Status>> + Send + 'static,
{
    Box::pin(async move {
        let method = tower::service_fn(move |request: Request<Req>| {
            (handler.clone())(Arc::clone(&inner), request)
        });
        let mut grpc = tonic::server::Grpc::new(ProstCodec::<Resp, Req>::default());
        Ok(grpc.unary(method, req).await)
    })
}

/// Route a call to `$method(&self, &CallContext, Req) -> FleetResult<Resp>`.
macro_rules! route {
    ($service:expr, $req:expr, $method:ident) => {
        $crate::grpc::unary($service, $req, |service, request| async move {
            let ctx = $crate::grpc::call_context(&request);
            service
                .$method(&ctx, request.into_inner())
                .await
                .map(::tonic::Response::new)
                .map_err($crate::grpc::status)
        })
    };
}

pub(crate) use route;

/// Context assembled by the tenancy and authentication layers.
pub fn call_context<M>(request: &Request<M>) -> CallContext {
    request
        .extensions()
        .get::<CallContext>()
        .cloned()
        .unwrap_or_default()
}

pub struct GrpcServer<T>(Arc<T>);

impl<T> GrpcServer<T> {
    pub fn new(inner: T) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    pub fn from_arc(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

impl<T> Clone for GrpcServer<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Dispatch> NamedService for GrpcServer<T> {
    const NAME: &'static str = T::NAME;
}

impl<T: Dispatch> tower::Service<http::Request<Body>> for GrpcServer<T> {
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = RouteFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let method = req
            .uri()
            .path()
            .rsplit_once('/')
            .map(|(_, method)| method.to_string())
            .unwrap_or_default();
        match Arc::clone(&self.0).dispatch(&method, req) {
            Some(future) => future,
            None => Box::pin(async { Ok(unimplemented_response()) }),
        }
    }
}

fn unimplemented_response() -> http::Response<Body> {
    let mut response = http::Response::new(Body::default());
    let headers = response.headers_mut();
    headers.insert(Status::GRPC_STATUS, (tonic::Code::Unimplemented as i32).into());
    headers.insert(
        http::header::CONTENT_TYPE,
        tonic::metadata::GRPC_CONTENT_TYPE,
    );
    response
}
