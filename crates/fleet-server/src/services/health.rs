//! `grpc.health.v1.Health/Check`, backed by a database ping.

use std::sync::Arc;

use fleet_core::CallContext;
use fleet_core::error::FleetResult;
use surrealdb::{Connection, Surreal};
use tonic::body::Body;
use tracing::warn;

use crate::grpc::{Dispatch, RouteFuture, route};
use crate::wire::health::{HealthCheckRequest, HealthCheckResponse, ServingStatus};

pub struct HealthApi<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> HealthApi<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub async fn check(
        &self,
        _ctx: &CallContext,
        _req: HealthCheckRequest,
    ) -> FleetResult<HealthCheckResponse> {
        let status = match fleet_db::ping(&self.db).await {
            Ok(()) => ServingStatus::Serving,
            Err(e) => {
                warn!(error = %e, "database ping failed");
                ServingStatus::NotServing
            }
        };
        Ok(HealthCheckResponse {
            status: status as i32,
        })
    }
}

impl<C: Connection> Dispatch for HealthApi<C> {
    const NAME: &'static str = "grpc.health.v1.Health";

    fn dispatch(self: Arc<Self>, method: &str, req: http::Request<Body>) -> Option<RouteFuture> {
        match method {
            "Check" => Some(route!(self, req, check)),
            _ => None,
        }
    }
}
