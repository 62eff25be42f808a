//! Integration tests for the authentication service.

use std::sync::{Arc, Mutex};

use fleet_auth::config::AuthConfig;
use fleet_auth::error::AuthError;
use fleet_auth::oauth::{OAuthProvider, ProviderProfile, ProviderTokens};
use fleet_auth::service::AuthService;
use fleet_auth::token::TokenService;
use fleet_core::error::FleetError;
use fleet_core::models::app_user::UpdateAppUser;
use fleet_core::models::oauth_account::Provider;
use fleet_core::pagination::Pagination;
use fleet_core::repository::{AppUserRepository, OAuthAccountRepository};
use fleet_db::repository::{SurrealAppUserRepository, SurrealOAuthAccountRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Provider double answering every exchange with the configured tokens.
struct FakeProvider {
    provider: Provider,
    tokens: Arc<Mutex<ProviderTokens>>,
    profile: ProviderProfile,
}

impl FakeProvider {
    fn google() -> Self {
        Self {
            provider: Provider::Google,
            tokens: Arc::new(Mutex::new(ProviderTokens {
                access_token: "a1".into(),
                refresh_token: Some("r1".into()),
                id_token: None,
                expires_in: 3600,
            })),
            profile: ProviderProfile {
                provider_user_id: "g-7".into(),
                email: Some("u@x".into()),
                display_name: "U".into(),
                picture: None,
            },
        }
    }

    fn line_without_email() -> Self {
        Self {
            provider: Provider::Line,
            tokens: Arc::new(Mutex::new(ProviderTokens {
                access_token: "l1".into(),
                refresh_token: None,
                id_token: None,
                expires_in: 2_592_000,
            })),
            profile: ProviderProfile {
                provider_user_id: "U123".into(),
                email: None,
                display_name: "Line User".into(),
                picture: Some("https://profile.line-scdn.net/p".into()),
            },
        }
    }
}

/// Change what the provider behind `tokens` answers from now on.
fn answer_with(tokens: &Mutex<ProviderTokens>, access_token: &str, refresh_token: Option<&str>) {
    let mut tokens = tokens.lock().unwrap();
    tokens.access_token = access_token.into();
    tokens.refresh_token = refresh_token.map(Into::into);
}

impl OAuthProvider for FakeProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://idp.test/{}?state={state}", self.provider))
    }

    async fn exchange(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        if code == "bad" {
            return Err(AuthError::Exchange {
                provider: self.provider.to_string(),
                message: "400 Bad Request: invalid_grant".into(),
            });
        }
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn profile(&self, _tokens: &ProviderTokens) -> Result<ProviderProfile, AuthError> {
        Ok(self.profile.clone())
    }
}

type Service =
    AuthService<SurrealAppUserRepository<Db>, SurrealOAuthAccountRepository<Db>, FakeProvider>;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-with-enough-entropy".into(),
        jwt_issuer: "fleet-test".into(),
        ..Default::default()
    }
}

async fn setup(providers: Vec<FakeProvider>) -> (Service, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleet_db::run_migrations(&db).await.unwrap();

    let service = AuthService::new(
        SurrealAppUserRepository::new(db.clone()),
        SurrealOAuthAccountRepository::new(db.clone()),
        TokenService::new(&test_config()),
        providers,
    );
    (service, db)
}

#[tokio::test]
async fn first_google_login_creates_the_user() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let output = service.login(Provider::Google, "abc").await.unwrap();
    assert!(output.created);
    assert_eq!(output.user.email.as_deref(), Some("u@x"));
    assert_eq!(output.user.iam_email, "u@x");
    assert_eq!(output.user.display_name, "U");
    assert!(!output.user.is_superadmin);
    assert_eq!(output.tokens.expires_in, 3600);

    let claims = service
        .tokens()
        .verify_access(&output.tokens.access_token)
        .unwrap();
    assert_eq!(claims.sub, output.user.id.to_string());
    assert_eq!(claims.email, "u@x");
}

#[tokio::test]
async fn repeated_login_reuses_the_user_and_refreshes_cached_tokens() {
    let google = FakeProvider::google();
    let answers = google.tokens.clone();
    let (service, db) = setup(vec![google]).await;

    let first = service.login(Provider::Google, "abc").await.unwrap();
    answer_with(&answers, "a2", Some("r2"));
    let second = service.login(Provider::Google, "abc").await.unwrap();

    assert!(!second.created);
    assert_eq!(first.user.id, second.user.id);

    let users = SurrealAppUserRepository::new(db.clone())
        .list(Pagination::default())
        .await
        .unwrap();
    assert_eq!(users.len(), 1);

    let accounts = SurrealOAuthAccountRepository::new(db)
        .list_by_user(first.user.id)
        .await
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].tokens.access_token.as_deref(), Some("a2"));
    assert_eq!(accounts[0].tokens.refresh_token.as_deref(), Some("r2"));
}

#[tokio::test]
async fn missing_provider_refresh_token_clears_the_cached_one() {
    let google = FakeProvider::google();
    let answers = google.tokens.clone();
    let (service, db) = setup(vec![google]).await;

    let first = service.login(Provider::Google, "abc").await.unwrap();
    answer_with(&answers, "a2", None);
    service.login(Provider::Google, "abc").await.unwrap();

    let accounts = SurrealOAuthAccountRepository::new(db)
        .list_by_user(first.user.id)
        .await
        .unwrap();
    assert_eq!(accounts[0].tokens.access_token.as_deref(), Some("a2"));
    assert_eq!(accounts[0].tokens.refresh_token, None);
}

#[tokio::test]
async fn line_login_without_email_uses_a_provider_scoped_identifier() {
    let (service, _db) = setup(vec![FakeProvider::line_without_email()]).await;

    let output = service.login(Provider::Line, "code").await.unwrap();
    assert!(output.created);
    assert_eq!(output.user.iam_email, "line:U123");
    assert_eq!(output.user.email, None);
    assert_eq!(
        output.user.avatar_url.as_deref(),
        Some("https://profile.line-scdn.net/p")
    );
}

#[tokio::test]
async fn rejected_code_is_an_authentication_failure() {
    let (service, db) = setup(vec![FakeProvider::google()]).await;

    let err = service.login(Provider::Google, "bad").await.unwrap_err();
    assert!(matches!(err, FleetError::AuthenticationFailed { .. }));

    let users = SurrealAppUserRepository::new(db)
        .list(Pagination::default())
        .await
        .unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn empty_code_is_rejected() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let err = service.login(Provider::Google, "").await.unwrap_err();
    assert!(matches!(err, FleetError::Validation { ref message } if message == "code is required"));
}

#[tokio::test]
async fn unconfigured_provider_is_unsupported() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let err = service.login(Provider::Line, "abc").await.unwrap_err();
    assert!(matches!(err, FleetError::Validation { .. }));
    assert_eq!(err.to_string(), "unsupported provider: line");
}

#[tokio::test]
async fn auth_url_dispatches_on_provider_name() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let url = service.get_auth_url("google", "s1").unwrap();
    assert_eq!(url, "https://idp.test/google?state=s1");

    let err = service.get_auth_url("github", "s1").unwrap_err();
    assert!(matches!(err, FleetError::Validation { .. }));

    let err = service.get_auth_url("google", "").unwrap_err();
    assert_eq!(err.to_string(), "state is required");
}

#[tokio::test]
async fn refresh_issues_a_new_pair_for_the_same_subject() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;
    let login = service.login(Provider::Google, "abc").await.unwrap();

    let refreshed = service
        .refresh_token(&login.tokens.refresh_token)
        .await
        .unwrap();
    assert_eq!(refreshed.tokens.expires_in, 3600);
    assert_eq!(refreshed.user.id, login.user.id);

    let claims = service
        .tokens()
        .verify_access(&refreshed.tokens.access_token)
        .unwrap();
    assert_eq!(claims.sub, login.user.id.to_string());
}

#[tokio::test]
async fn garbage_refresh_token_is_rejected() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let err = service.refresh_token("garbage").await.unwrap_err();
    assert!(
        matches!(err, FleetError::AuthenticationFailed { ref reason } if reason == "invalid refresh token")
    );
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;
    let login = service.login(Provider::Google, "abc").await.unwrap();

    let err = service
        .refresh_token(&login.tokens.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn refresh_for_deleted_user_is_not_found() {
    let (service, db) = setup(vec![FakeProvider::google()]).await;
    let login = service.login(Provider::Google, "abc").await.unwrap();

    SurrealAppUserRepository::new(db)
        .delete(login.user.id)
        .await
        .unwrap();

    let err = service
        .refresh_token(&login.tokens.refresh_token)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn validate_token_reports_the_current_user() {
    let (service, db) = setup(vec![FakeProvider::google()]).await;
    let login = service.login(Provider::Google, "abc").await.unwrap();

    SurrealAppUserRepository::new(db)
        .update(
            login.user.id,
            UpdateAppUser {
                display_name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let user = service
        .validate_token(&login.tokens.access_token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.id, login.user.id);
    assert_eq!(user.display_name, "Renamed");
}

#[tokio::test]
async fn validate_token_hides_the_failure_reason() {
    let (service, db) = setup(vec![FakeProvider::google()]).await;

    assert!(service.validate_token("garbage").await.unwrap().is_none());

    let login = service.login(Provider::Google, "abc").await.unwrap();
    assert!(
        service
            .validate_token(&login.tokens.refresh_token)
            .await
            .unwrap()
            .is_none()
    );

    SurrealAppUserRepository::new(db)
        .delete(login.user.id)
        .await
        .unwrap();
    assert!(
        service
            .validate_token(&login.tokens.access_token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn token_for_unknown_subject_is_invalid() {
    let (service, _db) = setup(vec![FakeProvider::google()]).await;

    let pair = service
        .tokens()
        .issue(&fleet_core::context::Principal {
            user_id: Uuid::new_v4().to_string(),
            email: "ghost@x".into(),
            display_name: "Ghost".into(),
            is_superadmin: false,
        })
        .unwrap();
    assert!(service.validate_token(&pair.access_token).await.unwrap().is_none());
}
