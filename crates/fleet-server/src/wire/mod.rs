//! Protobuf messages exchanged over gRPC, and their conversion to and
//! from domain types.

pub mod auth;
pub mod convert;
pub mod fleet;
pub mod health;
pub mod organization;

/// Shared `{success}` answer of delete-style RPCs.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SuccessResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

/// Paged list request used by the admin services.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PageRequest {
    /// Zero or negative means the default of 10.
    #[prost(int32, tag = "1")]
    pub page_size: i32,
    #[prost(string, tag = "2")]
    pub page_token: String,
}

/// Request addressing one record by id.
#[derive(Clone, PartialEq, prost::Message)]
pub struct IdRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}
