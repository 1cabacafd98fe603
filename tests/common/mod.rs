#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::env;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use zirox_backend::config::AppConfig;
use zirox_backend::handlers::ACCOUNT_ID_HEADER;
use zirox_backend::store::{MemoryStore, PlatformStore};
use zirox_backend::{AppState, app_router};

/// Router over a fresh in-memory store with the supply seeded
pub async fn memory_app(config: AppConfig) -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    store
        .ensure_global_supply(config.claim.max_supply)
        .await
        .expect("Failed to seed supply");
    let state = AppState::new(store.clone(), &config);
    (store, app_router(state))
}

/// Send a request and decode the JSON body (Null for empty bodies)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    account: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = account {
        builder = builder.header(ACCOUNT_ID_HEADER, id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Set up test database connection
/// Uses TEST_DATABASE_URL environment variable or falls back to default
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://zirox_user@localhost:5432/zirox_test".to_string());

    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Remove every row written by a test
pub async fn cleanup_test_db(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared(
        "TRUNCATE commission_records, claim_events, p2p_trades, price_samples, \
         daily_price_records, accounts, global_supply",
    )
    .await?;
    Ok(())
}
