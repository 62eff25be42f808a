//! SurrealDB implementation of [`OrganizationRepository`].

use chrono::{DateTime, Utc};
use fleet_core::error::FleetResult;
use fleet_core::models::organization::{
    CreateOrganization, Organization, OrganizationWithOwner, UpdateOrganization,
};
use fleet_core::pagination::Pagination;
use fleet_core::repository::OrganizationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::membership::MembershipRow;
use super::single;
use crate::error::{DbError, parse_uuid};

const ENTITY: &str = "organization";

#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    record_id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl OrganizationRow {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        Ok(Organization {
            id: parse_uuid(&self.record_id, "organization")?,
            name: self.name,
            slug: self.slug,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// Slugs are unique; an unspecified one is derived from the record id.
fn slug_or_default(slug: Option<String>, id: &str) -> String {
    slug.filter(|s| !s.is_empty()).unwrap_or_else(|| id.to_string())
}

pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealOrganizationRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> FleetResult<Organization> {
        let id = Uuid::new_v4().to_string();
        let slug = slug_or_default(input.slug, &id);

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET name = $name, slug = $slug; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("name", input.name))
            .bind(("slug", slug))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<OrganizationRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_organization()?)
    }

    async fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner: Uuid,
    ) -> FleetResult<OrganizationWithOwner> {
        let id = Uuid::new_v4().to_string();
        let membership_id = Uuid::new_v4().to_string();
        let slug = slug_or_default(input.slug, &id);

        self.db
            .query(
                "RETURN fn::create_organization_with_owner(\
                 $org_id, $name, $slug, $membership_id, $owner)",
            )
            .bind(("org_id", id.clone()))
            .bind(("name", input.name))
            .bind(("slug", slug))
            .bind(("membership_id", membership_id.clone()))
            .bind(("owner", owner.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id); \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('user_organization', $membership_id)",
            )
            .bind(("id", id.clone()))
            .bind(("membership_id", membership_id.clone()))
            .await
            .map_err(DbError::from)?;

        let orgs: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let members: Vec<MembershipRow> = result.take(1).map_err(DbError::from)?;
        Ok(OrganizationWithOwner {
            organization: single(orgs, ENTITY, id)?.try_into_organization()?,
            owner: single(members, "user_organization", membership_id)?.try_into_membership()?,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> FleetResult<Organization> {
        let id = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_organization()?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> FleetResult<Organization> {
        let id = id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) \
                 SET name = $name, slug = $slug, updated_at = time::now() \
                 WHERE deleted_at = NONE; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<OrganizationRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_organization()?)
    }

    async fn delete(&self, id: Uuid) -> FleetResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "UPDATE type::record('organization', $id) \
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

    async fn list(&self, pagination: Pagination) -> FleetResult<Vec<Organization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 WHERE deleted_at = NONE \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let orgs = rows
            .into_iter()
            .map(OrganizationRow::try_into_organization)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(orgs)
    }
}
