//! Authentication configuration.

/// Configuration for tokens, invitations and the login flow.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing access and refresh tokens.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 604_800 = 7 days).
    pub refresh_token_lifetime_secs: u64,
    /// How long an invitation stays acceptable (default: 168 = 7 days).
    pub invitation_ttl_hours: u64,
    /// Base URL of the web frontend; invitation links point below it.
    pub frontend_url: String,
}

impl AuthConfig {
    pub fn invite_url(&self, token: &str) -> String {
        format!("{}/invite/{token}", self.frontend_url.trim_end_matches('/'))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "fleet-ops".into(),
            access_token_lifetime_secs: 3600,
            refresh_token_lifetime_secs: 604_800,
            invitation_ttl_hours: 168,
            frontend_url: "https://localhost:3000".into(),
        }
    }
}
