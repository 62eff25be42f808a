//! OAuth 2.0 authorization-code clients for the supported identity
//! providers.
//!
//! Each provider exposes the same three calls: build the authorization
//! URL, exchange a code for tokens, and fetch the user's profile. The
//! orchestrator only talks to [`OAuthProvider`].

mod google;
mod line;

use fleet_core::models::oauth_account::Provider;
use reqwest::Url;

use crate::error::AuthError;

pub use google::GoogleClient;
pub use line::LineClient;

/// Client registration and endpoints for one provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl OAuthClientConfig {
    pub fn google(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
        }
    }

    pub fn line(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            scopes: vec!["profile".into(), "openid".into(), "email".into()],
            authorize_url: "https://access.line.me/oauth2/v2.1/authorize".into(),
            token_url: "https://api.line.me/oauth2/v2.1/token".into(),
            userinfo_url: "https://api.line.me/v2/profile".into(),
        }
    }

    /// Authorization endpoint with the standard code-flow parameters
    /// followed by any provider-specific `extra` ones.
    fn authorize_url_with(&self, state: &str, extra: &[(&str, &str)]) -> Result<String, AuthError> {
        let scope = self.scopes.join(" ");
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        params.extend_from_slice(extra);

        Url::parse_with_params(&self.authorize_url, &params)
            .map(String::from)
            .map_err(|e| AuthError::Config(format!("bad authorize url: {e}")))
    }
}

/// Tokens returned by a provider's token endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_in: i64,
}

/// The subset of a provider profile the login flow needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderProfile {
    pub provider_user_id: String,
    pub email: Option<String>,
    pub display_name: String,
    pub picture: Option<String>,
}

/// One identity provider.
pub trait OAuthProvider: Send + Sync {
    fn provider(&self) -> Provider;

    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;

    /// Exchange an authorization code. Non-2xx answers fail with
    /// [`AuthError::Exchange`].
    fn exchange(&self, code: &str) -> impl Future<Output = Result<ProviderTokens, AuthError>> + Send;

    /// Fetch the profile of the account the tokens belong to.
    fn profile(
        &self,
        tokens: &ProviderTokens,
    ) -> impl Future<Output = Result<ProviderProfile, AuthError>> + Send;
}

/// Raw token endpoint answer shared by both providers.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
}

impl From<TokenResponse> for ProviderTokens {
    fn from(raw: TokenResponse) -> Self {
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token.filter(|t| !t.is_empty()),
            id_token: raw.id_token.filter(|t| !t.is_empty()),
            expires_in: raw.expires_in,
        }
    }
}

/// Post the authorization-code grant to `config.token_url`.
async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthClientConfig,
    provider: Provider,
    code: &str,
) -> Result<ProviderTokens, AuthError> {
    let fail = |message: String| AuthError::Exchange {
        provider: provider.to_string(),
        message,
    };

    let response = http
        .post(&config.token_url)
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(fail(format!("{status}: {body}")));
    }

    let raw: TokenResponse = response.json().await.map_err(|e| fail(e.to_string()))?;
    Ok(raw.into())
}

/// `GET` a bearer-authenticated JSON document.
async fn get_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    access_token: &str,
    provider: Provider,
) -> Result<T, AuthError> {
    let fail = |message: String| AuthError::Profile {
        provider: provider.to_string(),
        message,
    };

    let response = http
        .get(url)
        .bearer_auth(access_token)
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

/// Either configured provider client, selected at run time.
#[derive(Clone)]
pub enum OAuthClient {
    Google(GoogleClient),
    Line(LineClient),
}

impl OAuthProvider for OAuthClient {
    fn provider(&self) -> Provider {
        match self {
            Self::Google(c) => c.provider(),
            Self::Line(c) => c.provider(),
        }
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        match self {
            Self::Google(c) => c.authorize_url(state),
            Self::Line(c) => c.authorize_url(state),
        }
    }

    async fn exchange(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        match self {
            Self::Google(c) => c.exchange(code).await,
            Self::Line(c) => c.exchange(code).await,
        }
    }

    async fn profile(&self, tokens: &ProviderTokens) -> Result<ProviderProfile, AuthError> {
        match self {
            Self::Google(c) => c.profile(tokens).await,
            Self::Line(c) => c.profile(tokens).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_drops_empty_optionals() {
        let raw: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a1","refresh_token":"","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        let tokens = ProviderTokens::from(raw);
        assert_eq!(tokens.access_token, "a1");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.id_token, None);
        assert_eq!(tokens.expires_in, 3600);
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let config = OAuthClientConfig::google(
            "cid".into(),
            "secret".into(),
            "https://app.example.com/callback".into(),
        );
        let url = config.authorize_url_with("a b&c", &[]).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(pairs.contains(&("state".into(), "a b&c".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://app.example.com/callback".into()
        )));
        assert!(!url.contains("secret"));
    }
}
