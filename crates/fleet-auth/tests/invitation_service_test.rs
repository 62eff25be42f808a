//! Integration tests for the invitation engine.

use fleet_auth::config::AuthConfig;
use fleet_auth::invitation::InvitationService;
use fleet_core::error::FleetError;
use fleet_core::models::app_user::CreateAppUser;
use fleet_core::models::invitation::InvitationStatus;
use fleet_core::models::membership::ROLE_MEMBER;
use fleet_core::models::organization::{CreateOrganization, Organization};
use fleet_core::repository::{AppUserRepository, MembershipRepository, OrganizationRepository};
use fleet_db::repository::{
    SurrealAppUserRepository, SurrealInvitationRepository, SurrealMembershipRepository,
    SurrealOrganizationRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = InvitationService<SurrealInvitationRepository<Db>, SurrealOrganizationRepository<Db>>;

struct Fixture {
    db: Surreal<Db>,
    org: Organization,
    u1: Uuid,
    u2: Uuid,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleet_db::run_migrations(&db).await.unwrap();

    let users = SurrealAppUserRepository::new(db.clone());
    let mut ids = Vec::new();
    for email in ["u1@example.com", "u2@example.com"] {
        let user = users
            .create(CreateAppUser {
                iam_email: email.into(),
                display_name: email.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(user.id);
    }

    let org = SurrealOrganizationRepository::new(db.clone())
        .create_with_owner(
            CreateOrganization {
                name: "o".into(),
                slug: None,
            },
            ids[0],
        )
        .await
        .unwrap()
        .organization;

    Fixture {
        db,
        org,
        u1: ids[0],
        u2: ids[1],
    }
}

fn service(db: &Surreal<Db>, config: AuthConfig) -> Service {
    InvitationService::new(
        SurrealInvitationRepository::new(db.clone()),
        SurrealOrganizationRepository::new(db.clone()),
        config,
    )
}

#[tokio::test]
async fn create_defaults_role_and_builds_the_invite_url() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());

    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();
    assert_eq!(inv.status, InvitationStatus::Pending);
    assert_eq!(inv.role, ROLE_MEMBER);
    assert_eq!(inv.invited_by, f.u1);
    assert!(inv.expires_at > inv.created_at);
    assert_eq!(
        svc.invite_url(&inv),
        format!("https://localhost:3000/invite/{}", inv.token)
    );
}

#[tokio::test]
async fn invite_url_follows_the_configured_frontend() {
    let f = setup().await;
    let svc = service(
        &f.db,
        AuthConfig {
            frontend_url: "https://fleet.example.com".into(),
            ..Default::default()
        },
    );

    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();
    assert!(
        svc.invite_url(&inv)
            .starts_with("https://fleet.example.com/invite/")
    );
}

#[tokio::test]
async fn second_create_returns_the_pending_invitation() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());

    let first = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();
    let second = svc.create(f.org.id, "b@x", "admin", f.u2).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.token, second.token);
    assert_eq!(second.role, ROLE_MEMBER);

    let all = svc.list(f.org.id, None, 0, 0).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn create_for_unknown_organization_is_not_found() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());

    let err = svc
        .create(Uuid::new_v4(), "b@x", "", f.u1)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_requires_an_email() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());

    let err = svc.create(f.org.id, "  ", "", f.u1).await.unwrap_err();
    assert!(matches!(err, FleetError::Validation { ref message } if message == "email is required"));
}

#[tokio::test]
async fn accept_creates_a_membership_and_consumes_the_invitation() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();

    let (accepted, membership) = svc.accept(&inv.token, f.u2).await.unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert_eq!(accepted.accepted_by, Some(f.u2));
    assert!(accepted.accepted_at.is_some());
    assert_eq!(membership.user_id, f.u2);
    assert_eq!(membership.organization_id, f.org.id);
    assert_eq!(membership.role, ROLE_MEMBER);
    assert!(!membership.is_default);

    let stored = SurrealMembershipRepository::new(f.db.clone())
        .get_by_user_and_organization(f.u2, f.org.id)
        .await
        .unwrap();
    assert_eq!(stored.id, membership.id);

    // The second attempt finds the caller already in the organization.
    let err = svc.accept(&inv.token, f.u2).await.unwrap_err();
    assert!(matches!(err, FleetError::Conflict { .. }));
}

#[tokio::test]
async fn existing_member_cannot_consume_the_invitation() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();

    let err = svc.accept(&inv.token, f.u1).await.unwrap_err();
    assert!(matches!(err, FleetError::Conflict { .. }));
    assert_eq!(err.to_string(), "already a member of this organization");

    let still = svc.get(inv.id).await.unwrap();
    assert_eq!(still.status, InvitationStatus::Pending);
}

#[tokio::test]
async fn expired_invitation_cannot_be_accepted() {
    let f = setup().await;
    let svc = service(
        &f.db,
        AuthConfig {
            invitation_ttl_hours: 0,
            ..Default::default()
        },
    );
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();
    assert_eq!(inv.status, InvitationStatus::Expired);

    let err = svc.accept(&inv.token, f.u2).await.unwrap_err();
    assert!(matches!(err, FleetError::FailedPrecondition { .. }));
    assert_eq!(err.to_string(), "invitation expired");

    let err = SurrealMembershipRepository::new(f.db.clone())
        .get_by_user_and_organization(f.u2, f.org.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());

    assert!(svc.accept("nope", f.u2).await.unwrap_err().is_not_found());
    assert!(svc.get_by_token("nope").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn get_by_token_includes_the_organization() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();

    let (found, org) = svc.get_by_token(&inv.token).await.unwrap();
    assert_eq!(found.id, inv.id);
    assert_eq!(org.id, f.org.id);
    assert_eq!(org.name, "o");
}

#[tokio::test]
async fn resend_rotates_token_and_extends_expiry() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();

    let resent = svc.resend(inv.id).await.unwrap();
    assert_eq!(resent.id, inv.id);
    assert_ne!(resent.token, inv.token);
    assert!(resent.expires_at >= inv.expires_at);
    assert_eq!(resent.status, InvitationStatus::Pending);

    // The old link is dead.
    assert!(svc.accept(&inv.token, f.u2).await.unwrap_err().is_not_found());
    svc.accept(&resent.token, f.u2).await.unwrap();

    let err = svc.resend(inv.id).await.unwrap_err();
    assert!(matches!(err, FleetError::FailedPrecondition { .. }));
}

#[tokio::test]
async fn resend_revives_an_expired_invitation() {
    let f = setup().await;
    let expired = service(
        &f.db,
        AuthConfig {
            invitation_ttl_hours: 0,
            ..Default::default()
        },
    )
    .create(f.org.id, "b@x", "", f.u1)
    .await
    .unwrap();

    let svc = service(&f.db, AuthConfig::default());
    let resent = svc.resend(expired.id).await.unwrap();
    assert_eq!(resent.status, InvitationStatus::Pending);

    svc.accept(&resent.token, f.u2).await.unwrap();
}

#[tokio::test]
async fn cancel_only_applies_to_pending_invitations() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    let inv = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();

    let cancelled = svc.cancel(inv.id).await.unwrap();
    assert_eq!(cancelled.status, InvitationStatus::Cancelled);

    let err = svc.accept(&inv.token, f.u2).await.unwrap_err();
    assert_eq!(err.to_string(), "invitation already used");

    let err = svc.cancel(inv.id).await.unwrap_err();
    assert!(matches!(err, FleetError::FailedPrecondition { .. }));
    assert_eq!(err.to_string(), "invitation is not pending");

    // A new invitation can be issued once the old one is cancelled.
    let again = svc.create(f.org.id, "b@x", "", f.u1).await.unwrap();
    assert_ne!(again.id, inv.id);
}

#[tokio::test]
async fn list_filters_by_status_and_caps_the_limit() {
    let f = setup().await;
    let svc = service(&f.db, AuthConfig::default());
    for i in 0..3 {
        svc.create(f.org.id, &format!("guest{i}@x"), "", f.u1)
            .await
            .unwrap();
    }
    let first = svc.list(f.org.id, None, 0, 0).await.unwrap();
    svc.cancel(first[0].id).await.unwrap();

    let pending = svc
        .list(f.org.id, Some(InvitationStatus::Pending), 0, 0)
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);

    let cancelled = svc
        .list(f.org.id, Some(InvitationStatus::Cancelled), 0, 0)
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);

    let page = svc.list(f.org.id, None, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);

    let all = svc.list(f.org.id, None, 10_000, -3).await.unwrap();
    assert_eq!(all.len(), 3);
}
