#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use pawtracker_api::auth::{generate_jwt, Claims};
use pawtracker_api::config::AppConfig;
use pawtracker_api::store::{DataStore, Filter, MemoryStore, Row, StoreError};
use pawtracker_api::{app, AppState};

pub const SECRET: &str = "integration-test-secret";
pub const ALICE: &str = "0f4a3a55-1111-4a57-9d8e-1f2a3b4c5d6e";
pub const BOB: &str = "7c1e2d3f-2222-4b68-8e9f-2a3b4c5d6e7f";

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|name| match name {
        "SUPABASE_JWT_SECRET" => Some(SECRET.to_string()),
        "STORE_BACKEND" => Some("memory".to_string()),
        "API_ENABLE_REQUEST_LOGGING" => Some("false".to_string()),
        _ => None,
    })
    .expect("test configuration is valid")
}

/// Router wired to an in-memory store the test can inspect
pub struct TestApp {
    pub store: MemoryStore,
    pub router: Router,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let router = app(AppState::new(test_config(), Arc::new(store.clone())));
        Self { store, router }
    }

    pub fn token_for(&self, sub: &str) -> String {
        generate_jwt(&Claims::new(sub, Duration::minutes(30)).with_email("owner@example.com"), SECRET)
            .expect("token signs")
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    /// Insert a pet owned by `owner` and return its id
    pub async fn seed_pet(&self, owner: &str, name: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.store
            .seed(
                "pets",
                row(json!({
                    "id": id,
                    "owner_id": owner,
                    "name": name,
                    "species": "Dog",
                    "breed": "Beagle",
                    "created_at": Utc::now(),
                })),
            )
            .await;
        id
    }

    pub async fn seed_profile(&self, id: &str, username: &str) {
        self.store
            .seed("profiles", row(json!({ "id": id, "username": username, "full_name": "Test Owner" })))
            .await;
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse { status, headers, body }
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().expect("object literal")
}

/// Sign an arbitrary claim set with the test secret
pub fn sign_claims(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).expect("claims sign")
}

/// Store whose every call fails with the error produced by `make`
pub struct FailingStore {
    pub make: fn() -> StoreError,
}

#[async_trait]
impl DataStore for FailingStore {
    async fn select(&self, _table: &str, _filter: &Filter) -> Result<Vec<Row>, StoreError> {
        Err((self.make)())
    }

    async fn insert(&self, _table: &str, _row: Row) -> Result<Row, StoreError> {
        Err((self.make)())
    }

    async fn update(&self, _table: &str, _id: &str, _patch: Row) -> Result<Option<Row>, StoreError> {
        Err((self.make)())
    }

    async fn delete(&self, _table: &str, _id: &str) -> Result<(), StoreError> {
        Err((self.make)())
    }

    async fn upload_blob(&self, _: &str, _: &str, _: Vec<u8>, _: &str) -> Result<String, StoreError> {
        Err((self.make)())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err((self.make)())
    }
}

pub fn failing_router(make: fn() -> StoreError) -> Router {
    app(AppState::new(test_config(), Arc::new(FailingStore { make })))
}

/// Serve the router on a free local port and return its base URL
pub async fn spawn_server(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(format!("http://127.0.0.1:{}", port))
}
