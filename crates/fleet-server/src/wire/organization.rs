//! `organization.*` messages: users, organizations, memberships and
//! invitations.

use prost_types::Timestamp;

#[derive(Clone, PartialEq, prost::Message)]
pub struct AppUser {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub iam_email: String,
    #[prost(string, tag = "3")]
    pub display_name: String,
    #[prost(bool, tag = "4")]
    pub is_superadmin: bool,
    #[prost(string, optional, tag = "5")]
    pub email: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub avatar_url: Option<String>,
    #[prost(message, optional, tag = "7")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "8")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateAppUserRequest {
    #[prost(string, tag = "1")]
    pub iam_email: String,
    #[prost(string, tag = "2")]
    pub display_name: String,
    #[prost(bool, tag = "3")]
    pub is_superadmin: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAppUserByIamEmailRequest {
    #[prost(string, tag = "1")]
    pub iam_email: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateAppUserRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub display_name: String,
    #[prost(bool, tag = "3")]
    pub is_superadmin: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListAppUsersResponse {
    #[prost(message, repeated, tag = "1")]
    pub app_users: Vec<AppUser>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Organization {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub slug: String,
    #[prost(message, optional, tag = "4")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "5")]
    pub updated_at: Option<Timestamp>,
}

/// The slug is always assigned by the server.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateOrganizationRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateOrganizationRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub slug: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListOrganizationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub organizations: Vec<Organization>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UserOrganization {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub user_id: String,
    #[prost(string, tag = "3")]
    pub organization_id: String,
    #[prost(string, tag = "4")]
    pub role: String,
    #[prost(bool, tag = "5")]
    pub is_default: bool,
    #[prost(message, optional, tag = "6")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "7")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateUserOrganizationRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(string, tag = "2")]
    pub organization_id: String,
    /// `member` when empty.
    #[prost(string, tag = "3")]
    pub role: String,
    #[prost(bool, tag = "4")]
    pub is_default: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateUserOrganizationRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub role: String,
    #[prost(bool, tag = "3")]
    pub is_default: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListUserOrganizationsByUserRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListUserOrganizationsByOrgRequest {
    #[prost(string, tag = "1")]
    pub organization_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListUserOrganizationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub user_organizations: Vec<UserOrganization>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Invitation {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub organization_id: String,
    #[prost(string, tag = "3")]
    pub email: String,
    #[prost(string, tag = "4")]
    pub role: String,
    #[prost(string, tag = "5")]
    pub token: String,
    #[prost(string, tag = "6")]
    pub invited_by: String,
    /// `pending`, `accepted`, `cancelled` or `expired`.
    #[prost(string, tag = "7")]
    pub status: String,
    #[prost(message, optional, tag = "8")]
    pub expires_at: Option<Timestamp>,
    #[prost(message, optional, tag = "9")]
    pub accepted_at: Option<Timestamp>,
    #[prost(string, optional, tag = "10")]
    pub accepted_by: Option<String>,
    #[prost(message, optional, tag = "11")]
    pub created_at: Option<Timestamp>,
    #[prost(message, optional, tag = "12")]
    pub updated_at: Option<Timestamp>,
    #[prost(string, tag = "13")]
    pub invite_url: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateInvitationRequest {
    /// Defaults to the caller's tenant.
    #[prost(string, tag = "1")]
    pub organization_id: String,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(string, tag = "3")]
    pub role: String,
}

/// Answer of `CreateInvitation` and `ResendInvitation`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct InvitationWithUrl {
    #[prost(message, optional, tag = "1")]
    pub invitation: Option<Invitation>,
    #[prost(string, tag = "2")]
    pub invite_url: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetInvitationResponse {
    #[prost(message, optional, tag = "1")]
    pub invitation: Option<Invitation>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TokenRequest {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetInvitationByTokenResponse {
    #[prost(message, optional, tag = "1")]
    pub invitation: Option<Invitation>,
    #[prost(message, optional, tag = "2")]
    pub organization: Option<Organization>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AcceptInvitationResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(message, optional, tag = "2")]
    pub user_organization: Option<UserOrganization>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListInvitationsRequest {
    /// Defaults to the caller's tenant.
    #[prost(string, tag = "1")]
    pub organization_id: String,
    /// Empty lists every status.
    #[prost(string, tag = "2")]
    pub status: String,
    #[prost(int32, tag = "3")]
    pub limit: i32,
    #[prost(int32, tag = "4")]
    pub offset: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListInvitationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub invitations: Vec<Invitation>,
}
