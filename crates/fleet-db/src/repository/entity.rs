//! SurrealDB implementation of [`EntityStore`].
//!
//! All fleet entities share the `entity_record` table. The record id is the
//! SHA-256 of `kind`, tenant and canonical key, so a lookup by key is a
//! direct record fetch and two tenants can never address the same row.

use chrono::{DateTime, Utc};
use fleet_core::context::TenantId;
use fleet_core::entity::{BulkOutcome, EntityDescriptor, EntityKey, EntityRecord, Fields};
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::pagination::Pagination;
use fleet_core::repository::EntityStore;
use serde_json::Value;
use sha2::{Digest, Sha256};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use super::single;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct EntityRow {
    payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl EntityRow {
    fn try_into_record(self) -> Result<EntityRecord, DbError> {
        let Value::Object(fields) = self.payload else {
            return Err(DbError::Decode("entity payload is not an object".into()));
        };
        Ok(EntityRecord {
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

fn record_id(entity: &EntityDescriptor, tenant: &TenantId, key: &EntityKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity.table.as_bytes());
    hasher.update([0]);
    hasher.update(tenant.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(key.canonical().as_bytes());
    hex::encode(hasher.finalize())
}

fn unique_marker(value: &Value) -> String {
    format!("u:{value}")
}

/// Value stored in the per-tenant unique index.
fn unique_value(entity: &EntityDescriptor, key: &EntityKey, fields: &Fields) -> FleetResult<String> {
    match entity.unique {
        Some(field) => fields
            .get(field)
            .filter(|v| !v.is_null())
            .map(unique_marker)
            .ok_or_else(|| FleetError::required(field)),
        None => Ok(format!("k:{}", key.canonical())),
    }
}

pub struct SurrealEntityStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealEntityStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealEntityStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EntityStore for SurrealEntityStore<C> {
    async fn create(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        fields: Fields,
    ) -> FleetResult<EntityRecord> {
        let key = entity.key_of(&fields)?;
        let id = record_id(entity, tenant, &key);
        let unique = unique_value(entity, &key, &fields)?;

        let result = self
            .db
            .query(
                "CREATE type::record('entity_record', $id) SET \
                 kind = $kind, \
                 tenant_id = $tenant_id, \
                 entity_key = $entity_key, \
                 unique_value = $unique_value, \
                 payload = $payload",
            )
            .bind(("id", id))
            .bind(("kind", entity.table.to_string()))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .bind(("entity_key", key.canonical()))
            .bind(("unique_value", unique))
            .bind(("payload", Value::Object(fields)))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, entity.table))?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, entity.table, key.to_string())?.try_into_record()?)
    }

    async fn get(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
    ) -> FleetResult<EntityRecord> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('entity_record', $id) \
                 WHERE tenant_id = $tenant_id AND deleted_at = NONE",
            )
            .bind(("id", record_id(entity, tenant, key)))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, entity.table, key.to_string())?.try_into_record()?)
    }

    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
        fields: Fields,
    ) -> FleetResult<EntityRecord> {
        let unique = unique_value(entity, key, &fields)?;

        let result = self
            .db
            .query(
                "UPDATE type::record('entity_record', $id) SET \
                 payload = $payload, \
                 unique_value = $unique_value, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id AND deleted_at = NONE",
            )
            .bind(("id", record_id(entity, tenant, key)))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .bind(("unique_value", unique))
            .bind(("payload", Value::Object(fields)))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, entity.table))?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, entity.table, key.to_string())?.try_into_record()?)
    }

    async fn delete(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        key: &EntityKey,
    ) -> FleetResult<()> {
        let id = record_id(entity, tenant, key);

        let Some(marker) = entity.soft_delete else {
            let mut result = self
                .db
                .query(
                    "DELETE type::record('entity_record', $id) \
                     WHERE tenant_id = $tenant_id RETURN BEFORE",
                )
                .bind(("id", id))
                .bind(("tenant_id", tenant.as_str().to_string()))
                .await
                .map_err(DbError::from)?;
            let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
            single(rows, entity.table, key.to_string())?;
            return Ok(());
        };

        let mut fields = self.get(entity, tenant, key).await?.fields;
        let now = Utc::now();
        fields.insert(marker.to_string(), Value::String(now.to_rfc3339()));

        let mut result = self
            .db
            .query(
                "UPDATE type::record('entity_record', $id) SET \
                 payload = $payload, \
                 deleted_at = $now, \
                 updated_at = $now \
                 WHERE tenant_id = $tenant_id AND deleted_at = NONE",
            )
            .bind(("id", id))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .bind(("payload", Value::Object(fields)))
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        single(rows, entity.table, key.to_string())?;
        Ok(())
    }

    async fn list(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        pagination: Pagination,
    ) -> FleetResult<Vec<EntityRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM entity_record \
                 WHERE kind = $kind AND tenant_id = $tenant_id AND deleted_at = NONE \
                 ORDER BY created_at ASC, entity_key ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("kind", entity.table.to_string()))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        let records = rows
            .into_iter()
            .map(EntityRow::try_into_record)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(records)
    }

    async fn find_unique(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        value: &Value,
    ) -> FleetResult<EntityRecord> {
        let Some(field) = entity.unique else {
            return Err(FleetError::Unimplemented {
                reason: format!("{} has no unique field", entity.singular),
            });
        };

        let mut result = self
            .db
            .query(
                "SELECT * FROM entity_record \
                 WHERE kind = $kind AND tenant_id = $tenant_id \
                 AND unique_value = $unique_value AND deleted_at = NONE \
                 LIMIT 1",
            )
            .bind(("kind", entity.table.to_string()))
            .bind(("tenant_id", tenant.as_str().to_string()))
            .bind(("unique_value", unique_marker(value)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EntityRow> = result.take(0).map_err(DbError::from)?;
        let id = match value {
            Value::String(s) => format!("{field}={s}"),
            other => format!("{field}={other}"),
        };
        Ok(single(rows, entity.table, id)?.try_into_record()?)
    }

    async fn bulk_create(
        &self,
        entity: &'static EntityDescriptor,
        tenant: &TenantId,
        rows: Vec<Fields>,
    ) -> FleetResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for fields in rows {
            match self.create(entity, tenant, fields).await {
                Ok(record) => outcome.created.push(record),
                Err(FleetError::AlreadyExists { .. }) => outcome.skipped += 1,
                Err(e) => return Err(e),
            }
        }
        debug!(
            entity = entity.table,
            tenant = %tenant,
            created = outcome.created.len(),
            skipped = outcome.skipped,
            "bulk insert finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::entity::catalog;
    use serde_json::json;

    use super::*;

    fn key(entity: &EntityDescriptor, value: Value) -> EntityKey {
        let Value::Object(fields) = value else {
            unreachable!()
        };
        entity.key_of(&fields).unwrap()
    }

    #[test]
    fn record_ids_differ_per_tenant_and_entity() {
        let a = TenantId::new("org-a").unwrap();
        let b = TenantId::new("org-b").unwrap();
        let k = key(&catalog::CAM_FILE, json!({"name": "n"}));

        assert_ne!(
            record_id(&catalog::CAM_FILE, &a, &k),
            record_id(&catalog::CAM_FILE, &b, &k)
        );
        assert_ne!(
            record_id(&catalog::CAM_FILE, &a, &k),
            record_id(&catalog::FLICKR_PHOTO, &a, &k)
        );
        assert_eq!(record_id(&catalog::CAM_FILE, &a, &k).len(), 64);
    }

    #[test]
    fn unique_value_uses_the_declared_field() {
        let d = &catalog::ETC_MEISAI;
        let k = key(d, json!({"id": "x"}));
        let Value::Object(fields) = json!({"id": "x", "hash": "h1"}) else {
            unreachable!()
        };
        assert_eq!(unique_value(d, &k, &fields).unwrap(), r#"u:"h1""#);

        let d = &catalog::URIAGE;
        let k = key(d, json!({"name": "n", "bumon": "b", "date": "d"}));
        assert_eq!(
            unique_value(d, &k, &Fields::new()).unwrap(),
            r#"k:["n","b","d"]"#
        );
    }
}
