//! SurrealDB implementation of [`InvitationRepository`].
//!
//! Acceptance runs inside the `fn::accept_invitation` stored function so
//! the membership check, the state checks, the status transition and the
//! membership insert commit together.

use chrono::{DateTime, Utc};
use fleet_core::error::{FleetResult, InvitationError};
use fleet_core::models::invitation::{CreateInvitation, Invitation, InvitationStatus};
use fleet_core::models::membership::UserOrganization;
use fleet_core::pagination::Pagination;
use fleet_core::repository::InvitationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::membership::MembershipRow;
use super::single;
use crate::error::{DbError, parse_uuid};

const ENTITY: &str = "invitation";

#[derive(Debug, SurrealValue)]
struct InvitationRow {
    record_id: String,
    organization_id: String,
    email: String,
    role: String,
    invite_token: String,
    invited_by: String,
    status: String,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    accepted_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvitationRow {
    fn try_into_invitation(self) -> Result<Invitation, DbError> {
        let status = self
            .status
            .parse::<InvitationStatus>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let accepted_by = self
            .accepted_by
            .as_deref()
            .map(|id| parse_uuid(id, "accepted_by"))
            .transpose()?;
        Ok(Invitation {
            id: parse_uuid(&self.record_id, "invitation")?,
            organization_id: parse_uuid(&self.organization_id, "organization_id")?,
            email: self.email,
            role: self.role,
            token: self.invite_token,
            invited_by: parse_uuid(&self.invited_by, "invited_by")?,
            status,
            expires_at: self.expires_at,
            accepted_at: self.accepted_at,
            accepted_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Status predicate for listing. `pending` and `expired` are derived
/// from the expiry, matching [`Invitation::effective_status`].
fn status_clause(status: Option<InvitationStatus>) -> &'static str {
    match status {
        None => "",
        Some(InvitationStatus::Pending) => " AND status = 'pending' AND expires_at > $now",
        Some(InvitationStatus::Expired) => {
            " AND (status = 'expired' OR (status = 'pending' AND expires_at <= $now))"
        }
        Some(_) => " AND status = $status",
    }
}

pub struct SurrealInvitationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealInvitationRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealInvitationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvitationRepository for SurrealInvitationRepository<C> {
    async fn create(&self, input: CreateInvitation) -> FleetResult<Invitation> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('invitation', $id) SET \
                 organization_id = $organization_id, \
                 email = $email, \
                 role = $role, \
                 invite_token = $invite_token, \
                 invited_by = $invited_by, \
                 status = 'pending', \
                 expires_at = $expires_at; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('invitation', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("email", input.email))
            .bind(("role", input.role))
            .bind(("invite_token", input.token))
            .bind(("invited_by", input.invited_by.to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<InvitationRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_invitation()?)
    }

    async fn get_by_id(&self, id: Uuid) -> FleetResult<Invitation> {
        let id = id.to_string();
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('invitation', $id)")
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_invitation()?)
    }

    async fn get_by_token(&self, token: &str) -> FleetResult<Invitation> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invitation \
                 WHERE invite_token = $invite_token",
            )
            .bind(("invite_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        // Never echo the token into errors.
        Ok(single(rows, ENTITY, "token")?.try_into_invitation()?)
    }

    async fn get_pending(
        &self,
        organization_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> FleetResult<Invitation> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invitation \
                 WHERE organization_id = $organization_id AND email = $email \
                 AND status = 'pending' AND expires_at > $now \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("organization_id", organization_id.to_string()))
            .bind(("email", email.to_string()))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let id = format!("organization_id={organization_id},email={email}");
        Ok(single(rows, ENTITY, id)?.try_into_invitation()?)
    }

    async fn accept(
        &self,
        id: Uuid,
        accepted_by: Uuid,
        now: DateTime<Utc>,
    ) -> FleetResult<(Invitation, UserOrganization)> {
        let id = id.to_string();
        let membership_id = Uuid::new_v4().to_string();

        self.db
            .query("RETURN fn::accept_invitation($id, $accepted_by, $membership_id, $now)")
            .bind(("id", id.clone()))
            .bind(("accepted_by", accepted_by.to_string()))
            .bind(("membership_id", membership_id.clone()))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                let err = DbError::from_statement(e, "user_organization");
                debug!(invitation_id = %id, error = %err, "invitation not accepted");
                err
            })?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('invitation', $id); \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user_organization', $membership_id)",
            )
            .bind(("id", id.clone()))
            .bind(("membership_id", membership_id.clone()))
            .await
            .map_err(DbError::from)?;

        let invitations: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let members: Vec<MembershipRow> = result.take(1).map_err(DbError::from)?;
        Ok((
            single(invitations, ENTITY, id)?.try_into_invitation()?,
            single(members, "user_organization", membership_id)?.try_into_membership()?,
        ))
    }

    async fn cancel(&self, id: Uuid) -> FleetResult<Invitation> {
        let current = self.get_by_id(id).await?;
        if current.status != InvitationStatus::Pending {
            return Err(InvitationError::NotPending.into());
        }

        let result = self
            .db
            .query(
                "UPDATE type::record('invitation', $id) \
                 SET status = 'cancelled', updated_at = time::now() \
                 WHERE status = 'pending'; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('invitation', $id)",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<InvitationRow> = result.take(1).map_err(DbError::from)?;
        let invitation = single(rows, ENTITY, id.to_string())?.try_into_invitation()?;
        // Lost a race with acceptance.
        if invitation.status != InvitationStatus::Cancelled {
            return Err(InvitationError::NotPending.into());
        }
        Ok(invitation)
    }

    async fn resend(
        &self,
        id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> FleetResult<Invitation> {
        let current = self.get_by_id(id).await?;
        if !matches!(
            current.status,
            InvitationStatus::Pending | InvitationStatus::Expired
        ) {
            return Err(InvitationError::NotPending.into());
        }

        let result = self
            .db
            .query(
                "UPDATE type::record('invitation', $id) SET \
                 invite_token = $invite_token, \
                 expires_at = $expires_at, \
                 status = 'pending', \
                 updated_at = time::now() \
                 WHERE status IN ['pending', 'expired']; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('invitation', $id)",
            )
            .bind(("id", id.to_string()))
            .bind(("invite_token", token.clone()))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<InvitationRow> = result.take(1).map_err(DbError::from)?;
        let invitation = single(rows, ENTITY, id.to_string())?.try_into_invitation()?;
        if invitation.token != token {
            return Err(InvitationError::NotPending.into());
        }
        Ok(invitation)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        status: Option<InvitationStatus>,
        pagination: Pagination,
    ) -> FleetResult<Vec<Invitation>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM invitation \
             WHERE organization_id = $organization_id{} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset",
            status_clause(status)
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("organization_id", organization_id.to_string()))
            .bind(("status", status.map(|s| s.as_str().to_string())))
            .bind(("now", Utc::now()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let invitations = rows
            .into_iter()
            .map(InvitationRow::try_into_invitation)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(invitations)
    }
}
