//! SurrealDB implementation of [`AppUserRepository`].

use chrono::{DateTime, Utc};
use fleet_core::error::FleetResult;
use fleet_core::models::app_user::{AppUser, CreateAppUser, UpdateAppUser};
use fleet_core::pagination::Pagination;
use fleet_core::repository::AppUserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::single;
use crate::error::{DbError, parse_uuid};

const ENTITY: &str = "app_user";

#[derive(Debug, SurrealValue)]
pub(crate) struct AppUserRow {
    record_id: String,
    iam_email: String,
    email: Option<String>,
    display_name: String,
    avatar_url: Option<String>,
    is_superadmin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl AppUserRow {
    pub(crate) fn try_into_app_user(self) -> Result<AppUser, DbError> {
        Ok(AppUser {
            id: parse_uuid(&self.record_id, "app_user")?,
            iam_email: self.iam_email,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            is_superadmin: self.is_superadmin,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

pub struct SurrealAppUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealAppUserRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealAppUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppUserRepository for SurrealAppUserRepository<C> {
    async fn create(&self, input: CreateAppUser) -> FleetResult<AppUser> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('app_user', $id) SET \
                 iam_email = $iam_email, \
                 email = $email, \
                 display_name = $display_name, \
                 avatar_url = $avatar_url, \
                 is_superadmin = $is_superadmin; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('app_user', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("iam_email", input.iam_email))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("avatar_url", input.avatar_url))
            .bind(("is_superadmin", input.is_superadmin))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<AppUserRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_app_user()?)
    }

    async fn get_by_id(&self, id: Uuid) -> FleetResult<AppUser> {
        let id = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('app_user', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppUserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_app_user()?)
    }

    async fn get_by_iam_email(&self, iam_email: &str) -> FleetResult<AppUser> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM app_user \
                 WHERE iam_email = $iam_email AND deleted_at = NONE \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("iam_email", iam_email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppUserRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, format!("iam_email={iam_email}"))?.try_into_app_user()?)
    }

    async fn update(&self, id: Uuid, input: UpdateAppUser) -> FleetResult<AppUser> {
        let id = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.is_superadmin.is_some() {
            sets.push("is_superadmin = $is_superadmin");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('app_user', $id) SET {} WHERE deleted_at = NONE; \
             SELECT meta::id(id) AS record_id, * FROM type::record('app_user', $id) \
             WHERE deleted_at = NONE",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.clone()));
        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(is_superadmin) = input.is_superadmin {
            builder = builder.bind(("is_superadmin", is_superadmin));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;
        let rows: Vec<AppUserRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_app_user()?)
    }

    async fn delete(&self, id: Uuid) -> FleetResult<()> {
        // Surface NotFound for unknown or already-deleted users.
        self.get_by_id(id).await?;

        self.db
            .query(
                "UPDATE type::record('app_user', $id) \
                 SET deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> FleetResult<Vec<AppUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM app_user \
                 WHERE deleted_at = NONE \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppUserRow> = result.take(0).map_err(DbError::from)?;
        let users = rows
            .into_iter()
            .map(AppUserRow::try_into_app_user)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(users)
    }
}
