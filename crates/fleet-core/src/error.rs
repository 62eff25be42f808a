//! Error types for the fleet-ops system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} already exists")]
    AlreadyExists { entity: String },

    #[error("{reason}")]
    Conflict { reason: String },

    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{reason}")]
    FailedPrecondition { reason: String },

    #[error("{reason}")]
    Unimplemented { reason: String },

    #[error("tenant context missing")]
    TenantContext,

    #[error("database error: {0}")]
    Database(String),

    #[error("upstream provider error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FleetError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Validation failure naming the missing field, e.g. `name is required`.
    pub fn required(field: &str) -> Self {
        Self::Validation {
            message: format!("{field} is required"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type FleetResult<T> = Result<T, FleetError>;

/// Sentinels raised by invitation acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvitationError {
    #[error("invitation not found")]
    NotFound,
    #[error("already a member of this organization")]
    AlreadyMember,
    #[error("invitation already used")]
    Used,
    #[error("invitation expired")]
    Expired,
    #[error("invitation is not pending")]
    NotPending,
}

impl From<InvitationError> for FleetError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::NotFound => FleetError::NotFound {
                entity: "invitation".into(),
                id: String::new(),
            },
            InvitationError::AlreadyMember => FleetError::Conflict {
                reason: err.to_string(),
            },
            InvitationError::Used | InvitationError::Expired | InvitationError::NotPending => {
                FleetError::FailedPrecondition {
                    reason: err.to_string(),
                }
            }
        }
    }
}
