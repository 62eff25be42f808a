//! `auth.AuthService` messages.

use super::organization::AppUser;

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAuthUrlRequest {
    /// `google` or `line`.
    #[prost(string, tag = "1")]
    pub provider: String,
    #[prost(string, tag = "2")]
    pub state: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetAuthUrlResponse {
    #[prost(string, tag = "1")]
    pub url: String,
}

/// Body of `AuthWithGoogle` and `AuthWithLine`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthWithCodeRequest {
    #[prost(string, tag = "1")]
    pub code: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RefreshTokenRequest {
    #[prost(string, tag = "1")]
    pub refresh_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthResponse {
    #[prost(string, tag = "1")]
    pub access_token: String,
    #[prost(string, tag = "2")]
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    #[prost(int64, tag = "3")]
    pub expires_in: i64,
    #[prost(message, optional, tag = "4")]
    pub user: Option<AppUser>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ValidateTokenRequest {
    #[prost(string, tag = "1")]
    pub access_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ValidateTokenResponse {
    #[prost(bool, tag = "1")]
    pub valid: bool,
    #[prost(message, optional, tag = "2")]
    pub user: Option<AppUser>,
}
