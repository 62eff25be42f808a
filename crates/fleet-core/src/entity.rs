//! Descriptor-driven tenant-scoped entities.
//!
//! Every fleet entity (camera files, inspections, driving logs, toll
//! records, sales, ...) shares one lifecycle: validate, delegate to the
//! [`EntityStore`](crate::repository::EntityStore), translate back. The
//! per-entity differences are captured by an [`EntityDescriptor`]; field
//! payloads are otherwise opaque JSON objects.

pub mod catalog;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::context::TenantId;
use crate::error::{FleetError, FleetResult};

/// Opaque entity payload.
pub type Fields = serde_json::Map<String, Value>;

/// Field carrying the tenant on every entity row.
pub const TENANT_FIELD: &str = "organization_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Present means a non-empty string.
    Text,
    /// Present means a non-zero number.
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

pub const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

pub const fn number(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Number,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// The incoming record replaces the stored payload.
    Replace,
    /// The incoming record is laid over the stored one; `immutable`
    /// fields keep their stored value.
    Merge { immutable: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    List,
    ListByOrganization,
    Lookup,
    BulkCreate,
}

#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Storage table and log label.
    pub table: &'static str,
    /// Fully qualified gRPC service name.
    pub service: &'static str,
    /// RPC noun for single-record methods (`CreateCamFile`).
    pub singular: &'static str,
    /// RPC noun for list methods (`ListCamFiles`).
    pub plural: &'static str,
    /// Key fields besides the implicit tenant.
    pub key: &'static [FieldSpec],
    /// The single key field is assigned a UUID on create.
    pub generated_key: bool,
    /// Fields that must be present on create.
    pub required: &'static [FieldSpec],
    /// Fields that must be present on update; `None` reuses `required`.
    pub required_on_update: Option<&'static [FieldSpec]>,
    pub update: UpdateMode,
    /// Payload field that mirrors the server-side deletion time. Entities
    /// with a soft-delete field are never physically removed.
    pub soft_delete: Option<&'static str>,
    /// Field unique per tenant.
    pub unique: Option<&'static str>,
    /// Method name of the lookup-by-unique-field RPC.
    pub lookup_method: Option<&'static str>,
    /// Expose `BulkCreate<singular>`.
    pub bulk_create: bool,
    /// Operations answered with `UNIMPLEMENTED` and the given reason.
    pub disabled: &'static [(Operation, &'static str)],
}

impl EntityDescriptor {
    pub const DEFAULT: EntityDescriptor = EntityDescriptor {
        table: "",
        service: "",
        singular: "",
        plural: "",
        key: &[],
        generated_key: false,
        required: &[],
        required_on_update: None,
        update: UpdateMode::Replace,
        soft_delete: None,
        unique: None,
        lookup_method: None,
        bulk_create: false,
        disabled: &[],
    };

    /// Map an RPC method name (the part after the service) to an operation.
    pub fn resolve(&self, method: &str) -> Option<Operation> {
        if let Some(rest) = method.strip_prefix("List") {
            if rest.strip_suffix("ByOrganization") == Some(self.plural) {
                return Some(Operation::ListByOrganization);
            }
            if rest == self.plural {
                return Some(Operation::List);
            }
        }
        if self.lookup_method == Some(method) {
            return Some(Operation::Lookup);
        }
        if self.bulk_create && method.strip_prefix("BulkCreate") == Some(self.singular) {
            return Some(Operation::BulkCreate);
        }
        let (op, noun) = if let Some(noun) = method.strip_prefix("Create") {
            (Operation::Create, noun)
        } else if let Some(noun) = method.strip_prefix("Get") {
            (Operation::Get, noun)
        } else if let Some(noun) = method.strip_prefix("Update") {
            (Operation::Update, noun)
        } else if let Some(noun) = method.strip_prefix("Delete") {
            (Operation::Delete, noun)
        } else {
            return None;
        };
        (noun == self.singular).then_some(op)
    }

    pub fn disabled_reason(&self, op: Operation) -> Option<&'static str> {
        self.disabled
            .iter()
            .find(|(disabled, _)| *disabled == op)
            .map(|(_, reason)| *reason)
    }

    /// Force the record into `tenant`, rejecting a body that names a
    /// different organization.
    pub fn scope_to_tenant(&self, tenant: &TenantId, fields: &mut Fields) -> FleetResult<()> {
        ensure_same_tenant(tenant, fields.get(TENANT_FIELD))?;
        fields.insert(TENANT_FIELD.into(), Value::String(tenant.as_str().into()));
        Ok(())
    }

    pub fn validate_create(&self, fields: &Fields) -> FleetResult<()> {
        if !self.generated_key {
            check_present(self.key, fields)?;
        }
        check_present(self.required, fields)
    }

    /// Give a generated key a fresh UUID unless the caller supplied one.
    pub fn assign_key(&self, fields: &mut Fields) {
        let (true, [spec]) = (self.generated_key, self.key) else {
            return;
        };
        if !matches!(fields.get(spec.name), Some(Value::String(s)) if !s.is_empty()) {
            fields.insert(spec.name.into(), Value::String(Uuid::new_v4().to_string()));
        }
    }

    pub fn validate_update(&self, fields: &Fields) -> FleetResult<()> {
        check_present(self.key, fields)?;
        check_present(self.required_on_update.unwrap_or(self.required), fields)
    }

    /// Extract and validate the key carried by `fields`.
    pub fn key_of(&self, fields: &Fields) -> FleetResult<EntityKey> {
        check_present(self.key, fields)?;
        let parts = self
            .key
            .iter()
            .map(|spec| {
                let value = fields.get(spec.name).cloned().unwrap_or(Value::Null);
                (spec.name, value)
            })
            .collect();
        Ok(EntityKey { parts })
    }

    /// Payload to persist on update given the stored and incoming records.
    pub fn merge_for_update(&self, stored: &Fields, incoming: Fields) -> Fields {
        match self.update {
            UpdateMode::Replace => incoming,
            UpdateMode::Merge { immutable } => {
                let mut merged = stored.clone();
                for (name, value) in incoming {
                    if immutable.contains(&name.as_str()) && stored.contains_key(&name) {
                        continue;
                    }
                    merged.insert(name, value);
                }
                merged
            }
        }
    }
}

/// Reject a payload whose `organization_id` names another tenant.
pub fn ensure_same_tenant(tenant: &TenantId, claimed: Option<&Value>) -> FleetResult<()> {
    match claimed {
        Some(Value::String(org)) if !org.is_empty() && org != tenant.as_str() => {
            Err(FleetError::AuthorizationDenied {
                reason: "organization_id does not match x-organization-id".into(),
            })
        }
        _ => Ok(()),
    }
}

fn check_present(specs: &[FieldSpec], fields: &Fields) -> FleetResult<()> {
    for spec in specs {
        match (spec.kind, fields.get(spec.name)) {
            (FieldKind::Text, Some(Value::String(s))) if !s.is_empty() => {}
            (FieldKind::Number, Some(Value::Number(n))) if n.as_f64() != Some(0.0) => {}
            (FieldKind::Text, Some(Value::Number(_) | Value::Bool(_))) => {
                return Err(FleetError::Validation {
                    message: format!("{} must be a string", spec.name),
                });
            }
            (FieldKind::Number, Some(Value::String(s))) if !s.is_empty() => {
                return Err(FleetError::Validation {
                    message: format!("{} must be a number", spec.name),
                });
            }
            _ => return Err(FleetError::required(spec.name)),
        }
    }
    Ok(())
}

/// Ordered key values of one entity row, tenant excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityKey {
    parts: Vec<(&'static str, Value)>,
}

impl EntityKey {
    pub fn parts(&self) -> &[(&'static str, Value)] {
        &self.parts
    }

    /// Stable textual form used to derive storage identifiers.
    pub fn canonical(&self) -> String {
        let values: Vec<&Value> = self.parts.iter().map(|(_, v)| v).collect();
        serde_json::to_string(&values).unwrap_or_default()
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match value {
                Value::String(s) => write!(f, "{name}={s}")?,
                other => write!(f, "{name}={other}")?,
            }
        }
        Ok(())
    }
}

/// A stored entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Result of a bulk insert that skips rows colliding on the unique field.
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    pub created: Vec<EntityRecord>,
    pub skipped: u64,
}
