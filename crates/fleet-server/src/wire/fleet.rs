//! Messages shared by every `fleet.*` entity service.
//!
//! Records travel as `google.protobuf.Struct`; the entity descriptor
//! decides which fields form the key and which are required.

use prost_types::{Struct, Timestamp};

/// Body of `Create*`, `Get*`, `Update*` and `Delete*`. Single-record
/// reads and deletes only need the key fields.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RecordRequest {
    #[prost(message, optional, tag = "1")]
    pub record: Option<Struct>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RecordResponse {
    #[prost(message, optional, tag = "1")]
    pub record: Option<Struct>,
    #[prost(message, optional, tag = "2")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListRecordsRequest {
    #[prost(int32, tag = "1")]
    pub page_size: i32,
    #[prost(string, tag = "2")]
    pub page_token: String,
    /// `List*ByOrganization` only; must match the tenant when set.
    #[prost(string, tag = "3")]
    pub organization_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListRecordsResponse {
    #[prost(message, repeated, tag = "1")]
    pub records: Vec<Struct>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

/// Lookup by the entity's unique field, e.g. `GetETCMeisaiByHash`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LookupRequest {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkCreateRequest {
    #[prost(message, repeated, tag = "1")]
    pub records: Vec<Struct>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BulkCreateResponse {
    #[prost(message, repeated, tag = "1")]
    pub records: Vec<Struct>,
    #[prost(int32, tag = "2")]
    pub created: i32,
    /// Records whose unique field was already taken.
    #[prost(int32, tag = "3")]
    pub skipped: i32,
}
