use fleet_core::FleetError;
use tonic::Status;
use tracing::warn;

/// Map a domain error to the status returned to the client.
pub fn status(err: FleetError) -> Status {
    match err {
        FleetError::Validation { message } => Status::invalid_argument(message),
        FleetError::TenantContext => Status::invalid_argument("missing x-organization-id header"),
        FleetError::AuthenticationFailed { reason } => Status::unauthenticated(reason),
        FleetError::AuthorizationDenied { reason } => Status::permission_denied(reason),
        FleetError::NotFound { entity, .. } => {
            Status::not_found(format!("{} not found", entity.replace('_', " ")))
        }
        FleetError::AlreadyExists { entity } => {
            Status::already_exists(format!("{} already exists", entity.replace('_', " ")))
        }
        FleetError::Conflict { reason } => Status::already_exists(reason),
        FleetError::FailedPrecondition { reason } => Status::failed_precondition(reason),
        FleetError::Unimplemented { reason } => Status::unimplemented(reason),
        err @ (FleetError::Database(_) | FleetError::Upstream(_) | FleetError::Internal(_)) => {
            warn!(error = %err, "request failed");
            Status::internal(format!("internal error: {err}"))
        }
    }
}
