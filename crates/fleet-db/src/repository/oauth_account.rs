//! SurrealDB implementation of [`OAuthAccountRepository`].

use chrono::{DateTime, Utc};
use fleet_core::error::FleetResult;
use fleet_core::models::app_user::{AppUser, CreateAppUser};
use fleet_core::models::oauth_account::{CachedTokens, CreateOAuthAccount, OAuthAccount, Provider};
use fleet_core::repository::OAuthAccountRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::app_user::AppUserRow;
use super::single;
use crate::error::{DbError, parse_uuid};

const ENTITY: &str = "oauth_account";

#[derive(Debug, SurrealValue)]
struct OAuthAccountRow {
    record_id: String,
    app_user_id: String,
    provider: String,
    provider_user_id: String,
    email: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OAuthAccountRow {
    fn try_into_account(self) -> Result<OAuthAccount, DbError> {
        let provider = self
            .provider
            .parse::<Provider>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        Ok(OAuthAccount {
            id: parse_uuid(&self.record_id, "oauth_account")?,
            app_user_id: parse_uuid(&self.app_user_id, "app_user_id")?,
            provider,
            provider_user_id: self.provider_user_id,
            email: self.email,
            tokens: CachedTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at: self.token_expires_at,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct SurrealOAuthAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealOAuthAccountRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealOAuthAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OAuthAccountRepository for SurrealOAuthAccountRepository<C> {
    async fn create(
        &self,
        app_user_id: Uuid,
        input: CreateOAuthAccount,
    ) -> FleetResult<OAuthAccount> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('oauth_account', $id) SET \
                 app_user_id = $app_user_id, \
                 provider = $provider, \
                 provider_user_id = $provider_user_id, \
                 email = $email, \
                 access_token = $access_token, \
                 refresh_token = $refresh_token, \
                 token_expires_at = $token_expires_at; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('oauth_account', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("app_user_id", app_user_id.to_string()))
            .bind(("provider", input.provider.as_str().to_string()))
            .bind(("provider_user_id", input.provider_user_id))
            .bind(("email", input.email))
            .bind(("access_token", input.tokens.access_token))
            .bind(("refresh_token", input.tokens.refresh_token))
            .bind(("token_expires_at", input.tokens.expires_at))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<OAuthAccountRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_account()?)
    }

    async fn create_with_user(
        &self,
        user: CreateAppUser,
        account: CreateOAuthAccount,
    ) -> FleetResult<(AppUser, OAuthAccount)> {
        let user_id = Uuid::new_v4().to_string();
        let account_id = Uuid::new_v4().to_string();

        self.db
            .query(
                "RETURN fn::create_user_with_account(\
                 $user_id, $iam_email, $email, $display_name, $avatar_url, \
                 $account_id, $provider, $provider_user_id, \
                 $access_token, $refresh_token, $token_expires_at)",
            )
            .bind(("user_id", user_id.clone()))
            .bind(("iam_email", user.iam_email))
            .bind(("email", user.email))
            .bind(("display_name", user.display_name))
            .bind(("avatar_url", user.avatar_url))
            .bind(("account_id", account_id.clone()))
            .bind(("provider", account.provider.as_str().to_string()))
            .bind(("provider_user_id", account.provider_user_id))
            .bind(("access_token", account.tokens.access_token))
            .bind(("refresh_token", account.tokens.refresh_token))
            .bind(("token_expires_at", account.tokens.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('app_user', $user_id); \
                 SELECT meta::id(id) AS record_id, * FROM type::record('oauth_account', $account_id)",
            )
            .bind(("user_id", user_id.clone()))
            .bind(("account_id", account_id.clone()))
            .await
            .map_err(DbError::from)?;

        let users: Vec<AppUserRow> = result.take(0).map_err(DbError::from)?;
        let accounts: Vec<OAuthAccountRow> = result.take(1).map_err(DbError::from)?;
        let user = single(users, "app_user", user_id)?.try_into_app_user()?;
        let account = single(accounts, ENTITY, account_id)?.try_into_account()?;
        Ok((user, account))
    }

    async fn get_by_provider_user(
        &self,
        provider: Provider,
        provider_user_id: &str,
    ) -> FleetResult<OAuthAccount> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM oauth_account \
                 WHERE provider = $provider AND provider_user_id = $provider_user_id",
            )
            .bind(("provider", provider.as_str().to_string()))
            .bind(("provider_user_id", provider_user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OAuthAccountRow> = result.take(0).map_err(DbError::from)?;
        let id = format!("{provider}:{provider_user_id}");
        Ok(single(rows, ENTITY, id)?.try_into_account()?)
    }

    async fn list_by_user(&self, app_user_id: Uuid) -> FleetResult<Vec<OAuthAccount>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM oauth_account \
                 WHERE app_user_id = $app_user_id ORDER BY created_at ASC",
            )
            .bind(("app_user_id", app_user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OAuthAccountRow> = result.take(0).map_err(DbError::from)?;
        let accounts = rows
            .into_iter()
            .map(OAuthAccountRow::try_into_account)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(accounts)
    }

    async fn update_tokens(&self, id: Uuid, tokens: CachedTokens) -> FleetResult<OAuthAccount> {
        let id = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('oauth_account', $id) SET \
                 access_token = $access_token, \
                 refresh_token = $refresh_token, \
                 token_expires_at = $token_expires_at, \
                 updated_at = time::now(); \
                 SELECT meta::id(id) AS record_id, * FROM type::record('oauth_account', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("access_token", tokens.access_token))
            .bind(("refresh_token", tokens.refresh_token))
            .bind(("token_expires_at", tokens.expires_at))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<OAuthAccountRow> = result.take(1).map_err(DbError::from)?;
        Ok(single(rows, ENTITY, id)?.try_into_account()?)
    }

    async fn delete_by_user(&self, app_user_id: Uuid) -> FleetResult<()> {
        self.db
            .query("DELETE oauth_account WHERE app_user_id = $app_user_id")
            .bind(("app_user_id", app_user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;
        Ok(())
    }
}
