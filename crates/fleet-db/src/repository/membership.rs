//! SurrealDB implementation of [`MembershipRepository`].

use chrono::{DateTime, Utc};
use fleet_core::error::FleetResult;
use fleet_core::models::membership::{
    CreateUserOrganization, UpdateUserOrganization, UserOrganization,
};
use fleet_core::pagination::Pagination;
use fleet_core::repository::MembershipRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::single;
use crate::error::{DbError, parse_uuid};

const ENTITY: &str = "user_organization";

#[derive(Debug, SurrealValue)]
pub(crate) struct MembershipRow {
    record_id: String,
    user_id: String,
    organization_id: String,
    role: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    pub(crate) fn try_into_membership(self) -> Result<UserOrganization, DbError> {
        Ok(UserOrganization {
            id: parse_uuid(&self.record_id, "user_organization")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            organization_id: parse_uuid(&self.organization_id, "organization_id")?,
            role: self.role,
            is_default: self.is_default,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_memberships(rows: Vec<MembershipRow>) -> Result<Vec<UserOrganization>, DbError> {
    rows.into_iter()
        .map(MembershipRow::try_into_membership)
        .collect()
}

pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealMembershipRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateUserOrganization) -> FleetResult<UserOrganization> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user_organization', $id) SET \
                 user_id = $user_id, \
                 organization_id = $organization_id, \
                 role = $role, \
                 is_default = $is_default; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('user_organization', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("role", input.role))
            .bind(("is_default", input.is_default))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<MembershipRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_membership()?)
    }

    async fn get_by_id(&self, id: Uuid) -> FleetResult<UserOrganization> {
        let id = id.to_string();
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('user_organization', $id)")
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_membership()?)
    }

    async fn get_by_user_and_organization(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> FleetResult<UserOrganization> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_organization \
                 WHERE user_id = $user_id AND organization_id = $organization_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let id = format!("user_id={user_id},organization_id={organization_id}");
        Ok(single(rows, ENTITY, id)?.try_into_membership()?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateUserOrganization,
    ) -> FleetResult<UserOrganization> {
        let id = id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('user_organization', $id) \
                 SET role = $role, is_default = $is_default, updated_at = time::now(); \
                 SELECT meta::id(id) AS record_id, * FROM type::record('user_organization', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("role", input.role))
            .bind(("is_default", input.is_default))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<MembershipRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_membership()?)
    }

    async fn delete(&self, id: Uuid) -> FleetResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('user_organization', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> FleetResult<Vec<UserOrganization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_organization \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_memberships(rows)?)
    }

    async fn list_by_user(&self, user_id: Uuid) -> FleetResult<Vec<UserOrganization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_organization \
                 WHERE user_id = $user_id ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_memberships(rows)?)
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> FleetResult<Vec<UserOrganization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_organization \
                 WHERE organization_id = $organization_id ORDER BY created_at ASC",
            )
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_memberships(rows)?)
    }
}
