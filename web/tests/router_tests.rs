//! Router-level tests: health handlers behind the correlation-id layer.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::{Router, routing::get};
use axum_test::TestServer;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use volunteer_hub_core::store::DocumentStore;
use volunteer_hub_testing::InMemoryDocumentStore;
use volunteer_hub_web::correlation_id_layer;
use volunteer_hub_web::handlers::{liveness, readiness};

fn server(store: &InMemoryDocumentStore) -> TestServer {
    let state: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let app = Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .layer(correlation_id_layer())
        .with_state(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn every_response_carries_a_correlation_id() {
    let server = server(&InMemoryDocumentStore::new());

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");

    let generated = response.headers().get("x-correlation-id").unwrap();
    assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn incoming_correlation_id_is_echoed() {
    let server = server(&InMemoryDocumentStore::new());
    let id = Uuid::new_v4().to_string();

    let response = server
        .get("/ready")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get("x-correlation-id").unwrap().to_str().unwrap(),
        id
    );
}

#[tokio::test]
async fn readiness_fails_while_the_store_is_down() {
    let store = InMemoryDocumentStore::new();
    let server = server(&store);

    store.set_unavailable(true);
    let response = server.get("/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["status"], "unavailable");
}
