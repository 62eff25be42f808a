//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    fleet_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "app_user",
        "oauth_account",
        "organization",
        "user_organization",
        "invitation",
        "entity_record",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
    for function in [
        "create_user_with_account",
        "create_organization_with_owner",
        "accept_invitation",
    ] {
        assert!(info_str.contains(function), "missing fn::{function}");
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    fleet_db::run_migrations(&db).await.unwrap();
    fleet_db::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn ping_answers_on_a_live_connection() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    fleet_db::ping(&db).await.unwrap();
}
