//! Google OAuth 2.0 client.

use fleet_core::models::oauth_account::Provider;
use serde::Deserialize;

use super::{
    OAuthClientConfig, OAuthProvider, ProviderProfile, ProviderTokens, exchange_code, get_json,
};
use crate::error::AuthError;

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUserInfo> for ProviderProfile {
    fn from(info: GoogleUserInfo) -> Self {
        Self {
            provider_user_id: info.id,
            email: info.email.filter(|e| !e.is_empty()),
            display_name: info.name,
            picture: info.picture.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Clone)]
pub struct GoogleClient {
    config: OAuthClientConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(config: OAuthClientConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

impl OAuthProvider for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    /// Requests offline access with forced consent so Google always
    /// returns a refresh token.
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        self.config
            .authorize_url_with(state, &[("access_type", "offline"), ("prompt", "consent")])
    }

    async fn exchange(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        exchange_code(&self.http, &self.config, Provider::Google, code).await
    }

    async fn profile(&self, tokens: &ProviderTokens) -> Result<ProviderProfile, AuthError> {
        let info: GoogleUserInfo = get_json(
            &self.http,
            &self.config.userinfo_url,
            &tokens.access_token,
            Provider::Google,
        )
        .await?;
        Ok(info.into())
    }
}
