//! Integration tests for app users and their provider linkages.

use fleet_core::error::FleetError;
use fleet_core::models::app_user::{CreateAppUser, UpdateAppUser};
use fleet_core::models::oauth_account::{CachedTokens, CreateOAuthAccount, Provider};
use fleet_core::pagination::Pagination;
use fleet_core::repository::{AppUserRepository, OAuthAccountRepository};
use fleet_db::repository::{SurrealAppUserRepository, SurrealOAuthAccountRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleet_db::run_migrations(&db).await.unwrap();
    db
}

fn new_user(email: &str) -> CreateAppUser {
    CreateAppUser {
        iam_email: email.into(),
        email: Some(email.into()),
        display_name: "Alice".into(),
        ..Default::default()
    }
}

fn google_account(sub: &str) -> CreateOAuthAccount {
    CreateOAuthAccount {
        provider: Provider::Google,
        provider_user_id: sub.into(),
        email: Some("alice@example.com".into()),
        tokens: CachedTokens {
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            expires_at: None,
        },
    }
}

#[tokio::test]
async fn create_and_get_app_user() {
    let db = setup().await;
    let repo = SurrealAppUserRepository::new(db);

    let user = repo.create(new_user("alice@example.com")).await.unwrap();
    assert_eq!(user.display_name, "Alice");
    assert!(!user.is_superadmin);
    assert!(user.deleted_at.is_none());

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched, user);

    let by_email = repo.get_by_iam_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn update_app_user_keeps_unset_fields() {
    let db = setup().await;
    let repo = SurrealAppUserRepository::new(db);
    let user = repo.create(new_user("bob@example.com")).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateAppUser {
                is_superadmin: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_superadmin);
    assert_eq!(updated.display_name, "Alice");
}

#[tokio::test]
async fn deleted_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealAppUserRepository::new(db);
    let user = repo.create(new_user("carol@example.com")).await.unwrap();

    repo.delete(user.id).await.unwrap();

    let err = repo.get_by_id(user.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.list(Pagination::default()).await.unwrap().is_empty());
    assert!(repo.delete(user.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn create_with_user_links_both_rows() {
    let db = setup().await;
    let accounts = SurrealOAuthAccountRepository::new(db.clone());
    let users = SurrealAppUserRepository::new(db);

    let (user, account) = accounts
        .create_with_user(new_user("alice@example.com"), google_account("g-1"))
        .await
        .unwrap();
    assert_eq!(account.app_user_id, user.id);
    assert_eq!(account.provider, Provider::Google);
    assert_eq!(account.tokens.refresh_token.as_deref(), Some("rt"));

    let found = accounts
        .get_by_provider_user(Provider::Google, "g-1")
        .await
        .unwrap();
    assert_eq!(found.id, account.id);
    assert_eq!(users.get_by_id(user.id).await.unwrap().id, user.id);
}

#[tokio::test]
async fn duplicate_linkage_rolls_back_the_user() {
    let db = setup().await;
    let accounts = SurrealOAuthAccountRepository::new(db.clone());
    let users = SurrealAppUserRepository::new(db);

    accounts
        .create_with_user(new_user("first@example.com"), google_account("g-dup"))
        .await
        .unwrap();

    let err = accounts
        .create_with_user(new_user("second@example.com"), google_account("g-dup"))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::AlreadyExists { .. }), "{err:?}");

    let orphan = users.get_by_iam_email("second@example.com").await;
    assert!(orphan.unwrap_err().is_not_found());
}

#[tokio::test]
async fn same_subject_on_another_provider_is_distinct() {
    let db = setup().await;
    let accounts = SurrealOAuthAccountRepository::new(db);

    accounts
        .create_with_user(new_user("a@example.com"), google_account("shared"))
        .await
        .unwrap();

    let mut line = google_account("shared");
    line.provider = Provider::Line;
    let (user, _) = accounts
        .create_with_user(new_user("b@example.com"), line)
        .await
        .unwrap();

    let linked = accounts.list_by_user(user.id).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].provider, Provider::Line);
}

#[tokio::test]
async fn update_tokens_replaces_the_cache() {
    let db = setup().await;
    let accounts = SurrealOAuthAccountRepository::new(db);
    let (_, account) = accounts
        .create_with_user(new_user("a@example.com"), google_account("g-2"))
        .await
        .unwrap();

    let updated = accounts
        .update_tokens(
            account.id,
            CachedTokens {
                access_token: Some("at-2".into()),
                refresh_token: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.tokens.access_token.as_deref(), Some("at-2"));
    assert!(updated.tokens.refresh_token.is_none());
}

#[tokio::test]
async fn delete_by_user_removes_linkages() {
    let db = setup().await;
    let accounts = SurrealOAuthAccountRepository::new(db);
    let (user, _) = accounts
        .create_with_user(new_user("a@example.com"), google_account("g-3"))
        .await
        .unwrap();

    accounts.delete_by_user(user.id).await.unwrap();

    assert!(accounts.list_by_user(user.id).await.unwrap().is_empty());
    assert!(
        accounts
            .get_by_provider_user(Provider::Google, "g-3")
            .await
            .unwrap_err()
            .is_not_found()
    );
}
