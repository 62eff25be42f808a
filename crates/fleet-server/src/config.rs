//! Server configuration from command-line flags and environment.

use std::net::SocketAddr;

use clap::Parser;
use fleet_auth::AuthConfig;
use fleet_auth::oauth::OAuthClientConfig;
use fleet_db::DbConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "fleet-server")]
#[command(version, about = "Multi-tenant fleet operations gRPC server", long_about = None)]
pub struct ServerConfig {
    #[arg(long, env = "GRPC_PORT", default_value_t = 50051)]
    pub grpc_port: u16,

    /// Invitation links point below this URL.
    #[arg(long, env = "FRONTEND_URL", default_value = "https://localhost:3000")]
    pub frontend_url: String,

    /// SurrealDB WebSocket address without scheme.
    #[arg(long, env = "SURREAL_URL", default_value = "127.0.0.1:8000")]
    pub surreal_url: String,

    #[arg(long, env = "SURREAL_NAMESPACE", default_value = "fleet")]
    pub surreal_namespace: String,

    #[arg(long, env = "SURREAL_DATABASE", default_value = "ops")]
    pub surreal_database: String,

    #[arg(long, env = "SURREAL_USER", default_value = "root")]
    pub surreal_user: String,

    #[arg(long, env = "SURREAL_PASSWORD", default_value = "root", hide_env_values = true)]
    pub surreal_password: String,

    /// HMAC secret for access and refresh tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "JWT_ISSUER", default_value = "fleet-ops")]
    pub jwt_issuer: String,

    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub access_token_ttl_secs: u64,

    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value_t = 604_800)]
    pub refresh_token_ttl_secs: u64,

    #[arg(long, env = "INVITATION_TTL_HOURS", default_value_t = 168)]
    pub invitation_ttl_hours: u64,

    /// Google login is enabled when set.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub google_client_secret: String,

    #[arg(long, env = "GOOGLE_REDIRECT_URI", default_value = "")]
    pub google_redirect_uri: String,

    /// LINE login is enabled when set.
    #[arg(long, env = "LINE_CLIENT_ID")]
    pub line_client_id: Option<String>,

    #[arg(long, env = "LINE_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub line_client_secret: String,

    #[arg(long, env = "LINE_REDIRECT_URI", default_value = "")]
    pub line_redirect_uri: String,

    /// Reject calls without a bearer token. When off, such calls run
    /// anonymously.
    #[arg(long, env = "REQUIRE_AUTH", default_value_t = true, action = clap::ArgAction::Set)]
    pub require_auth: bool,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.grpc_port))
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            jwt_issuer: self.jwt_issuer.clone(),
            access_token_lifetime_secs: self.access_token_ttl_secs,
            refresh_token_lifetime_secs: self.refresh_token_ttl_secs,
            invitation_ttl_hours: self.invitation_ttl_hours,
            frontend_url: self.frontend_url.clone(),
        }
    }

    pub fn database(&self) -> DbConfig {
        DbConfig {
            url: self.surreal_url.clone(),
            namespace: self.surreal_namespace.clone(),
            database: self.surreal_database.clone(),
            username: self.surreal_user.clone(),
            password: self.surreal_password.clone(),
        }
    }

    pub fn google(&self) -> Option<OAuthClientConfig> {
        self.google_client_id.clone().map(|id| {
            OAuthClientConfig::google(
                id,
                self.google_client_secret.clone(),
                self.google_redirect_uri.clone(),
            )
        })
    }

    pub fn line(&self) -> Option<OAuthClientConfig> {
        self.line_client_id.clone().map(|id| {
            OAuthClientConfig::line(
                id,
                self.line_client_secret.clone(),
                self.line_redirect_uri.clone(),
            )
        })
    }
}
