//! Per-call context.
//!
//! A [`CallContext`] is created by the transport for every RPC and
//! enriched by the tenancy and authentication layers before the handler
//! runs. Enrichment never mutates an existing context: `with_*` returns
//! a new value, so a caller holding the original never observes the
//! change. There is no process-wide state.

use std::fmt;
use std::sync::Arc;

use crate::error::{FleetError, FleetResult};

/// Organization identifier used as the tenancy scope.
///
/// Always non-empty; construct with [`TenantId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(Arc<str>);

impl TenantId {
    /// Returns `None` for an empty identifier.
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            return None;
        }
        Some(Self(Arc::from(id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated caller, as asserted by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub is_superadmin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    tenant: Option<TenantId>,
    principal: Option<Arc<Principal>>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context scoped to `tenant`.
    pub fn with_tenant(&self, tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
            principal: self.principal.clone(),
        }
    }

    /// Returns a copy of this context carrying `principal`.
    pub fn with_principal(&self, principal: Principal) -> Self {
        Self {
            tenant: self.tenant.clone(),
            principal: Some(Arc::new(principal)),
        }
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_deref()
    }

    /// Tenant scope or [`FleetError::TenantContext`].
    pub fn require_tenant(&self) -> FleetResult<&TenantId> {
        self.tenant.as_ref().ok_or(FleetError::TenantContext)
    }

    /// Authenticated caller or `AuthenticationFailed`.
    pub fn require_principal(&self) -> FleetResult<&Principal> {
        self.principal
            .as_deref()
            .ok_or_else(|| FleetError::AuthenticationFailed {
                reason: "authentication required".into(),
            })
    }
}
