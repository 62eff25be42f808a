//! Fleet auth: signed token pairs, Google/LINE OAuth clients, login and
//! identity reconciliation, invitations and organization bootstrap.

pub mod config;
pub mod error;
pub mod invitation;
pub mod oauth;
pub mod organization;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use invitation::InvitationService;
pub use organization::OrganizationService;
pub use service::{AuthService, LoginOutput};
pub use token::{AccessTokenClaims, TokenPair, TokenService};
