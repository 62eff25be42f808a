//! Domain models for the identity and organization side of the system.
//!
//! Fleet entities are not modelled here; they are opaque payloads described
//! by [`crate::entity::EntityDescriptor`].

pub mod app_user;
pub mod invitation;
pub mod membership;
pub mod oauth_account;
pub mod organization;
