//! Authentication service: OAuth login, identity reconciliation and
//! token refresh/introspection.

use chrono::{Duration, Utc};
use fleet_core::context::Principal;
use fleet_core::error::{FleetError, FleetResult};
use fleet_core::models::app_user::{AppUser, CreateAppUser};
use fleet_core::models::oauth_account::{CachedTokens, CreateOAuthAccount, Provider};
use fleet_core::repository::{AppUserRepository, OAuthAccountRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::oauth::{OAuthProvider, ProviderProfile, ProviderTokens};
use crate::token::{TokenPair, TokenService};

/// Successful login or refresh.
#[derive(Debug)]
pub struct LoginOutput {
    pub tokens: TokenPair,
    pub user: AppUser,
    /// Whether this login created the user.
    pub created: bool,
}

/// Authentication service.
///
/// Generic over repository implementations and the provider client so
/// that the auth layer has no dependency on the database crate and tests
/// can substitute providers.
pub struct AuthService<U, O, P>
where
    U: AppUserRepository,
    O: OAuthAccountRepository,
    P: OAuthProvider,
{
    users: U,
    accounts: O,
    tokens: TokenService,
    providers: Vec<P>,
}

impl<U, O, P> AuthService<U, O, P>
where
    U: AppUserRepository,
    O: OAuthAccountRepository,
    P: OAuthProvider,
{
    pub fn new(users: U, accounts: O, tokens: TokenService, providers: Vec<P>) -> Self {
        Self {
            users,
            accounts,
            tokens,
            providers,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn client(&self, provider: Provider) -> FleetResult<&P> {
        self.providers
            .iter()
            .find(|p| p.provider() == provider)
            .ok_or_else(|| AuthError::UnsupportedProvider(provider.to_string()).into())
    }

    /// Authorization URL for `provider` (`google` or `line`).
    pub fn get_auth_url(&self, provider: &str, state: &str) -> FleetResult<String> {
        if provider.is_empty() {
            return Err(FleetError::required("provider"));
        }
        if state.is_empty() {
            return Err(FleetError::required("state"));
        }
        let provider: Provider = provider.parse()?;
        Ok(self.client(provider)?.authorize_url(state)?)
    }

    /// Complete an authorization-code login with `provider`.
    ///
    /// Exchange, profile fetch, reconciliation and token issue run in
    /// that order; a failure at any step stops the flow.
    pub async fn login(&self, provider: Provider, code: &str) -> FleetResult<LoginOutput> {
        if code.is_empty() {
            return Err(FleetError::required("code"));
        }
        let client = self.client(provider)?;

        let provider_tokens = client.exchange(code).await.inspect_err(|e| {
            warn!(provider = %provider, error = %e, "authorization code exchange failed");
        })?;

        let profile = client.profile(&provider_tokens).await.inspect_err(|e| {
            warn!(provider = %provider, error = %e, "profile fetch failed");
        })?;

        let (user, created) = self
            .reconcile(provider, &profile, &provider_tokens)
            .await?;
        let tokens = self.issue(&user)?;

        info!(
            provider = %provider,
            user_id = %user.id,
            created,
            "login succeeded"
        );
        Ok(LoginOutput {
            tokens,
            user,
            created,
        })
    }

    /// Find the user linked to the provider account, or create the user
    /// and the linkage together.
    async fn reconcile(
        &self,
        provider: Provider,
        profile: &ProviderProfile,
        provider_tokens: &ProviderTokens,
    ) -> FleetResult<(AppUser, bool)> {
        let cached = CachedTokens {
            access_token: Some(provider_tokens.access_token.clone()),
            refresh_token: provider_tokens.refresh_token.clone(),
            expires_at: Some(Utc::now() + Duration::seconds(provider_tokens.expires_in)),
        };

        let account = match self
            .accounts
            .get_by_provider_user(provider, &profile.provider_user_id)
            .await
        {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                let new_user = CreateAppUser {
                    iam_email: profile
                        .email
                        .clone()
                        .unwrap_or_else(|| format!("{provider}:{}", profile.provider_user_id)),
                    email: profile.email.clone(),
                    display_name: profile.display_name.clone(),
                    avatar_url: profile.picture.clone(),
                    is_superadmin: false,
                };
                let linkage = CreateOAuthAccount {
                    provider,
                    provider_user_id: profile.provider_user_id.clone(),
                    email: profile.email.clone(),
                    tokens: cached.clone(),
                };
                match self.accounts.create_with_user(new_user, linkage).await {
                    Ok((user, _)) => {
                        info!(provider = %provider, user_id = %user.id, "created user on first login");
                        return Ok((user, true));
                    }
                    // A concurrent first login won the race; use its linkage.
                    Err(FleetError::AlreadyExists { .. }) => {
                        debug!(provider = %provider, "linkage created concurrently");
                        self.accounts
                            .get_by_provider_user(provider, &profile.provider_user_id)
                            .await?
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        let user = self.users.get_by_id(account.app_user_id).await?;
        self.accounts.update_tokens(account.id, cached).await?;
        Ok((user, false))
    }

    fn issue(&self, user: &AppUser) -> FleetResult<TokenPair> {
        let principal = Principal {
            user_id: user.id.to_string(),
            email: user.email.clone().unwrap_or_default(),
            display_name: user.display_name.clone(),
            is_superadmin: user.is_superadmin,
        };
        Ok(self.tokens.issue(&principal)?)
    }

    /// Exchange a refresh token for a new pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> FleetResult<LoginOutput> {
        if refresh_token.is_empty() {
            return Err(FleetError::required("refresh_token"));
        }

        let invalid = || FleetError::AuthenticationFailed {
            reason: "invalid refresh token".into(),
        };
        let subject = self.tokens.verify_refresh(refresh_token).map_err(|e| match e {
            AuthError::TokenExpired => FleetError::AuthenticationFailed {
                reason: "refresh token has expired".into(),
            },
            _ => invalid(),
        })?;
        let user_id = Uuid::parse_str(&subject).map_err(|_| invalid())?;

        let user = self.users.get_by_id(user_id).await?;
        let tokens = self.issue(&user)?;
        Ok(LoginOutput {
            tokens,
            user,
            created: false,
        })
    }

    /// Introspect an access token. `None` means invalid; the reason is
    /// deliberately not reported.
    pub async fn validate_token(&self, access_token: &str) -> FleetResult<Option<AppUser>> {
        if access_token.is_empty() {
            return Err(FleetError::required("access_token"));
        }

        let Ok(claims) = self.tokens.verify_access(access_token) else {
            return Ok(None);
        };
        let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
            return Ok(None);
        };
        match self.users.get_by_id(user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "token subject not loadable");
                Ok(None)
            }
        }
    }
}
