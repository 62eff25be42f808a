pub mod context;
pub mod entity;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;

pub use context::{CallContext, Principal, TenantId};
pub use error::{FleetError, FleetResult, InvitationError};
