//! Conversions between wire messages and domain types.

use chrono::{DateTime, Utc};
use fleet_core::entity::{EntityRecord, Fields};
use fleet_core::models::app_user::AppUser;
use fleet_core::models::invitation::Invitation;
use fleet_core::models::membership::UserOrganization;
use fleet_core::models::organization::Organization;
use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Timestamp};
use serde_json::{Number, Value};

use super::fleet::RecordResponse;
use super::organization as wire;

pub fn timestamp(at: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

/// JSON object carried by a `google.protobuf.Struct`.
pub fn struct_to_fields(record: Struct) -> Fields {
    record
        .fields
        .into_iter()
        .map(|(name, value)| (name, value_to_json(value)))
        .collect()
}

pub fn fields_to_struct(fields: Fields) -> Struct {
    Struct {
        fields: fields
            .into_iter()
            .map(|(name, value)| (name, json_to_value(value)))
            .collect(),
    }
}

fn value_to_json(value: prost_types::Value) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::NumberValue(n)) => number_to_json(n),
        Some(Kind::StructValue(s)) => Value::Object(struct_to_fields(s)),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
    }
}

/// Struct numbers are doubles; integral values come back as integers so
/// keys like `12` and `12.0` compare equal once stored.
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn json_to_value(value: Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::String(s) => Kind::StringValue(s),
        Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        Value::Object(fields) => Kind::StructValue(fields_to_struct(fields)),
        Value::Array(values) => Kind::ListValue(ListValue {
            values: values.into_iter().map(json_to_value).collect(),
        }),
    };
    prost_types::Value { kind: Some(kind) }
}

impl From<EntityRecord> for RecordResponse {
    fn from(record: EntityRecord) -> Self {
        Self {
            record: Some(fields_to_struct(record.fields)),
            created_at: Some(timestamp(record.created_at)),
            updated_at: Some(timestamp(record.updated_at)),
        }
    }
}

impl From<AppUser> for wire::AppUser {
    fn from(user: AppUser) -> Self {
        Self {
            id: user.id.to_string(),
            iam_email: user.iam_email,
            display_name: user.display_name,
            is_superadmin: user.is_superadmin,
            email: user.email,
            avatar_url: user.avatar_url,
            created_at: Some(timestamp(user.created_at)),
            updated_at: Some(timestamp(user.updated_at)),
        }
    }
}

impl From<Organization> for wire::Organization {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id.to_string(),
            name: org.name,
            slug: org.slug,
            created_at: Some(timestamp(org.created_at)),
            updated_at: Some(timestamp(org.updated_at)),
        }
    }
}

impl From<UserOrganization> for wire::UserOrganization {
    fn from(m: UserOrganization) -> Self {
        Self {
            id: m.id.to_string(),
            user_id: m.user_id.to_string(),
            organization_id: m.organization_id.to_string(),
            role: m.role,
            is_default: m.is_default,
            created_at: Some(timestamp(m.created_at)),
            updated_at: Some(timestamp(m.updated_at)),
        }
    }
}

pub fn invitation(inv: Invitation, invite_url: String) -> wire::Invitation {
    wire::Invitation {
        id: inv.id.to_string(),
        organization_id: inv.organization_id.to_string(),
        email: inv.email,
        role: inv.role,
        token: inv.token,
        invited_by: inv.invited_by.to_string(),
        status: inv.status.as_str().to_string(),
        expires_at: Some(timestamp(inv.expires_at)),
        accepted_at: inv.accepted_at.map(timestamp),
        accepted_by: inv.accepted_by.map(|id| id.to_string()),
        created_at: Some(timestamp(inv.created_at)),
        updated_at: Some(timestamp(inv.updated_at)),
        invite_url,
    }
}
