//! LINE Login v2.1 client.
//!
//! The profile endpoint never returns an email; when the token response
//! carries an ID token it is verified with LINE and its `email` claim
//! fills the gap.

use fleet_core::models::oauth_account::Provider;
use serde::Deserialize;
use tracing::warn;

use super::{
    OAuthClientConfig, OAuthProvider, ProviderProfile, ProviderTokens, exchange_code, get_json,
};
use crate::error::AuthError;

const DEFAULT_VERIFY_URL: &str = "https://api.line.me/oauth2/v2.1/verify";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineProfile {
    user_id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    picture_url: Option<String>,
}

/// Payload returned by the ID token verification endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LineIdToken {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct LineClient {
    config: OAuthClientConfig,
    verify_url: String,
    http: reqwest::Client,
}

impl LineClient {
    pub fn new(config: OAuthClientConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            verify_url: DEFAULT_VERIFY_URL.into(),
            http,
        }
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }

    /// Have LINE verify an ID token issued to this channel.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<LineIdToken, AuthError> {
        let fail = |message: String| AuthError::Profile {
            provider: Provider::Line.to_string(),
            message,
        };

        let response = self
            .http
            .post(&self.verify_url)
            .form(&[
                ("id_token", id_token),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fail(format!("{status}: {body}")));
        }
        response.json().await.map_err(|e| fail(e.to_string()))
    }
}

impl OAuthProvider for LineClient {
    fn provider(&self) -> Provider {
        Provider::Line
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        self.config.authorize_url_with(state, &[])
    }

    async fn exchange(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        exchange_code(&self.http, &self.config, Provider::Line, code).await
    }

    async fn profile(&self, tokens: &ProviderTokens) -> Result<ProviderProfile, AuthError> {
        let raw: LineProfile = get_json(
            &self.http,
            &self.config.userinfo_url,
            &tokens.access_token,
            Provider::Line,
        )
        .await?;

        // A failed ID token check only costs us the email.
        let email = match tokens.id_token.as_deref() {
            Some(id_token) => match self.verify_id_token(id_token).await {
                Ok(payload) => payload.email.filter(|e| !e.is_empty()),
                Err(e) => {
                    warn!(error = %e, "LINE id token verification failed");
                    None
                }
            },
            None => None,
        };

        Ok(ProviderProfile {
            provider_user_id: raw.user_id,
            email,
            display_name: raw.display_name,
            picture: raw.picture_url.filter(|p| !p.is_empty()),
        })
    }
}
