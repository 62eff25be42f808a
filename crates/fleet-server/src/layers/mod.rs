//! `tower` layers wrapped around every route.

pub mod auth;
pub mod tenancy;

use fleet_auth::TokenService;
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};

pub use auth::AuthLayer;
pub use tenancy::TenancyLayer;

/// Layers in the order the server applies them, outermost first.
pub type CallLayers = ServiceBuilder<Stack<AuthLayer, Stack<TenancyLayer, Identity>>>;

/// Tenancy runs before authentication, so a call without a tenant is
/// rejected as such whatever its credentials.
pub fn call_layers(tokens: TokenService, require_auth: bool) -> CallLayers {
    ServiceBuilder::new()
        .layer(TenancyLayer)
        .layer(AuthLayer::new(tokens, require_auth))
}
