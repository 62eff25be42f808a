//! gRPC service façades.

pub mod app_user;
pub mod auth;
pub mod entity;
pub mod health;
pub mod invitation;
pub mod membership;
pub mod organization;

use fleet_core::error::{FleetError, FleetResult};
use fleet_core::{CallContext, pagination::PageRequest};
use uuid::Uuid;

/// Parse a required UUID field of a request.
pub(crate) fn parse_id(field: &str, value: &str) -> FleetResult<Uuid> {
    if value.is_empty() {
        return Err(FleetError::required(field));
    }
    Uuid::parse_str(value).map_err(|_| FleetError::Validation {
        message: format!("{field} must be a UUID"),
    })
}

/// Authenticated caller's user id.
pub(crate) fn caller_id(ctx: &CallContext) -> FleetResult<Uuid> {
    let principal = ctx.require_principal()?;
    Uuid::parse_str(&principal.user_id).map_err(|_| FleetError::AuthenticationFailed {
        reason: "token subject is not a user id".into(),
    })
}

/// Caller's user id when authenticated, `None` for anonymous calls.
pub(crate) fn optional_caller_id(ctx: &CallContext) -> FleetResult<Option<Uuid>> {
    match ctx.principal() {
        Some(_) => caller_id(ctx).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn page_request(page_size: i32, page_token: &str) -> FleetResult<PageRequest> {
    PageRequest::from_wire(page_size, page_token)
}
