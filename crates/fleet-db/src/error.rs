//! Database-specific error types and conversions.

use fleet_core::error::{FleetError, InvitationError};

/// Markers raised with `THROW` by the stored functions in the schema.
pub(crate) const THROWN_NOT_FOUND: &str = "fleet:invitation_not_found";
pub(crate) const THROWN_ALREADY_MEMBER: &str = "fleet:already_member";
pub(crate) const THROWN_USED: &str = "fleet:invitation_used";
pub(crate) const THROWN_EXPIRED: &str = "fleet:invitation_expired";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error(transparent)]
    Invitation(#[from] InvitationError),
}

impl DbError {
    /// Classify a failed statement. Uniqueness violations and thrown
    /// sentinels become their typed variants; anything else is a plain
    /// query failure.
    pub(crate) fn from_statement(err: surrealdb::Error, entity: &str) -> Self {
        let message = err.to_string();
        let sentinels = [
            (THROWN_NOT_FOUND, InvitationError::NotFound),
            (THROWN_ALREADY_MEMBER, InvitationError::AlreadyMember),
            (THROWN_USED, InvitationError::Used),
            (THROWN_EXPIRED, InvitationError::Expired),
        ];
        if let Some((_, sentinel)) = sentinels.iter().find(|(tag, _)| message.contains(tag)) {
            return Self::Invitation(*sentinel);
        }
        if message.contains("already contains") || message.contains("already exists") {
            return Self::AlreadyExists {
                entity: entity.into(),
            };
        }
        Self::Query(message)
    }

    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for FleetError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FleetError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => FleetError::AlreadyExists { entity },
            DbError::Invitation(sentinel) => sentinel.into(),
            other => FleetError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {column} UUID: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_survive_conversion() {
        let err: FleetError = DbError::Invitation(InvitationError::Used).into();
        assert_eq!(err.to_string(), "invitation already used");

        let err: FleetError = DbError::AlreadyExists {
            entity: "user_organization".into(),
        }
        .into();
        assert!(matches!(err, FleetError::AlreadyExists { .. }));

        let err: FleetError = DbError::Query("boom".into()).into();
        assert!(matches!(err, FleetError::Database(_)));
    }
}
