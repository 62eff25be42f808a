//! SurrealDB repository implementations.

mod app_user;
mod entity;
mod invitation;
mod membership;
mod oauth_account;
mod organization;

pub use app_user::SurrealAppUserRepository;
pub use entity::SurrealEntityStore;
pub use invitation::SurrealInvitationRepository;
pub use membership::SurrealMembershipRepository;
pub use oauth_account::SurrealOAuthAccountRepository;
pub use organization::SurrealOrganizationRepository;

use crate::error::DbError;

/// First row of a result set, or `NotFound`.
fn single<T>(rows: Vec<T>, entity: &str, id: impl Into<String>) -> Result<T, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found(entity, id))
}
