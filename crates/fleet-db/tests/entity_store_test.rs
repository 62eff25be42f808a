//! Integration tests for the shared fleet entity store.

use fleet_core::context::TenantId;
use fleet_core::entity::{Fields, catalog};
use fleet_core::error::FleetError;
use fleet_core::pagination::Pagination;
use fleet_core::repository::EntityStore;
use fleet_db::repository::SurrealEntityStore;
use serde_json::{Value, json};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealEntityStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    fleet_db::run_migrations(&db).await.unwrap();
    SurrealEntityStore::new(db)
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

fn uriage(name: &str, amount: i64) -> Fields {
    fields(json!({
        "name": name, "bumon": "b1", "date": "2024-04-01",
        "kingaku": amount, "organization_id": "org-a"
    }))
}

#[tokio::test]
async fn create_then_get_round_trips_the_payload() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::URIAGE;

    let created = store.create(entity, &org, uriage("n1", 100)).await.unwrap();
    assert_eq!(created.fields["kingaku"], json!(100));
    assert!(created.deleted_at.is_none());

    let key = entity.key_of(&uriage("n1", 0)).unwrap();
    let fetched = store.get(entity, &org, &key).await.unwrap();
    assert_eq!(fetched.fields, created.fields);
}

#[tokio::test]
async fn duplicate_key_is_already_exists() {
    let store = setup().await;
    let org = tenant("org-a");

    store
        .create(&catalog::URIAGE, &org, uriage("n1", 1))
        .await
        .unwrap();
    let err = store
        .create(&catalog::URIAGE, &org, uriage("n1", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn tenants_are_isolated() {
    let store = setup().await;
    let a = tenant("org-a");
    let b = tenant("org-b");
    let entity = &catalog::URIAGE;

    store.create(entity, &a, uriage("n1", 1)).await.unwrap();
    let key = entity.key_of(&uriage("n1", 0)).unwrap();

    assert!(store.get(entity, &b, &key).await.unwrap_err().is_not_found());
    assert!(
        store
            .list(entity, &b, Pagination::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(store.delete(entity, &b, &key).await.unwrap_err().is_not_found());
    assert!(
        store
            .update(entity, &b, &key, uriage("n1", 5))
            .await
            .unwrap_err()
            .is_not_found()
    );

    // The same key is free in another tenant.
    store.create(entity, &b, uriage("n1", 2)).await.unwrap();
    assert_eq!(
        store.get(entity, &a, &key).await.unwrap().fields["kingaku"],
        json!(1)
    );
}

#[tokio::test]
async fn update_replaces_the_payload() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::URIAGE;
    let created = store.create(entity, &org, uriage("n1", 1)).await.unwrap();
    let key = entity.key_of(&created.fields).unwrap();

    let updated = store
        .update(entity, &org, &key, uriage("n1", 9))
        .await
        .unwrap();
    assert_eq!(updated.fields["kingaku"], json!(9));
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn hard_delete_removes_the_row() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::URIAGE;
    let created = store.create(entity, &org, uriage("n1", 1)).await.unwrap();
    let key = entity.key_of(&created.fields).unwrap();

    store.delete(entity, &org, &key).await.unwrap();
    assert!(store.get(entity, &org, &key).await.unwrap_err().is_not_found());
    assert!(store.delete(entity, &org, &key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn soft_delete_hides_the_row() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::CAR_INSPECTION_FILES;
    assert!(entity.soft_delete.is_some());

    let record = fields(json!({
        "uuid": "f-1", "type": "pdf", "elect_cert_mg_no": "e1",
        "elect_cert_publishdate_e": "R", "elect_cert_publishdate_y": "06",
        "elect_cert_publishdate_m": "04", "elect_cert_publishdate_d": "01",
        "created": "2024-04-01T00:00:00Z", "modified": "2024-04-01T00:00:00Z"
    }));
    let created = store.create(entity, &org, record).await.unwrap();
    let key = entity.key_of(&created.fields).unwrap();

    store.delete(entity, &org, &key).await.unwrap();

    assert!(store.get(entity, &org, &key).await.unwrap_err().is_not_found());
    assert!(
        store
            .list(entity, &org, Pagination::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(store.delete(entity, &org, &key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn list_pages_in_insertion_order() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::URIAGE;
    for (i, name) in ["n1", "n2", "n3"].iter().enumerate() {
        store
            .create(entity, &org, uriage(name, i as i64))
            .await
            .unwrap();
    }

    let first = store
        .list(entity, &org, Pagination { offset: 0, limit: 2 })
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    let rest = store
        .list(entity, &org, Pagination { offset: 2, limit: 2 })
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);

    let names: Vec<_> = first
        .iter()
        .chain(rest.iter())
        .map(|r| r.fields["name"].clone())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&json!("n1")));
    assert!(names.contains(&json!("n3")));
}

fn etc_row(id: &str, hash: &str) -> Fields {
    fields(json!({
        "id": id, "hash": hash, "date_to": "2024-04-01",
        "date_to_date": "2024-04-01", "ic_fr": "a", "ic_to": "b",
        "etc_num": "1234", "price": 100, "shashu": 1
    }))
}

#[tokio::test]
async fn find_unique_locates_by_hash() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::ETC_MEISAI;

    store.create(entity, &org, etc_row("1", "h1")).await.unwrap();

    let found = store
        .find_unique(entity, &org, &json!("h1"))
        .await
        .unwrap();
    assert_eq!(found.fields["id"], json!("1"));

    let missing = store.find_unique(entity, &org, &json!("h2")).await;
    assert!(missing.unwrap_err().is_not_found());

    let elsewhere = store.find_unique(entity, &tenant("org-b"), &json!("h1")).await;
    assert!(elsewhere.unwrap_err().is_not_found());
}

#[tokio::test]
async fn unique_field_collision_is_already_exists() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::ETC_MEISAI;

    store.create(entity, &org, etc_row("1", "h1")).await.unwrap();
    let err = store
        .create(entity, &org, etc_row("2", "h1"))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn bulk_create_skips_collisions() {
    let store = setup().await;
    let org = tenant("org-a");
    let entity = &catalog::ETC_MEISAI;
    store.create(entity, &org, etc_row("0", "h0")).await.unwrap();

    let outcome = store
        .bulk_create(
            entity,
            &org,
            vec![etc_row("1", "h1"), etc_row("2", "h0"), etc_row("3", "h1")],
        )
        .await
        .unwrap();
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.skipped, 2);
}

#[tokio::test]
async fn find_unique_without_unique_field_is_unimplemented() {
    let store = setup().await;
    let err = store
        .find_unique(&catalog::URIAGE, &tenant("org-a"), &json!("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Unimplemented { .. }), "{err:?}");
}
