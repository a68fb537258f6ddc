//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::util::ServiceExt;

use ledger_core::api::{self, AppState};
use ledger_core::{db, LedgerFacade, MemoryStore, StateStore};

/// Application over a fresh in-memory store, amounts in cents
pub fn memory_app() -> Router {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let ledger = LedgerFacade::new(store);
    api::build_app(AppState::new(ledger, 2))
}

/// Send a request and decode the JSON body (Null when empty)
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Connect to DATABASE_URL and reset the world-state table
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = db::connect(&database_url, 5)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool)
        .await
        .expect("Failed to create schema");

    sqlx::query("TRUNCATE TABLE world_state")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
