// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the catalog backend and its storage bucket.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use catalog_client::config::Config;
use catalog_client::models::{CredentialPair, Identity};
use catalog_client::services::{CredentialStore, Notifier};
use catalog_client::CatalogApp;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Object written to the mock bucket.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub bytes: Vec<u8>,
}

/// Mock backend state and call counters.
pub struct Backend {
    pub base_url: Mutex<String>,
    /// Access token the product routes currently accept
    pub valid_access: Mutex<String>,
    pub refresh_token: String,
    pub refresh_status: AtomicU16,
    pub refresh_delay: Mutex<Duration>,
    /// Product routes answer 401 even to fresh tokens
    pub always_unauthorized: AtomicBool,
    /// Upload-target endpoint answers without a write location
    pub omit_upload_url: AtomicBool,
    pub storage_status: AtomicU16,

    pub refresh_calls: AtomicUsize,
    pub api_calls: AtomicUsize,
    pub upload_target_calls: AtomicUsize,
    pub storage_puts: AtomicUsize,

    pub authorization_seen: Mutex<Vec<Option<String>>>,
    pub refresh_authorization_seen: Mutex<Vec<Option<String>>>,
    pub last_saved: Mutex<Option<Value>>,
    pub stored_object: Mutex<Option<StoredObject>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: Mutex::new(String::new()),
            valid_access: Mutex::new("A1".to_string()),
            refresh_token: "R1".to_string(),
            refresh_status: AtomicU16::new(200),
            refresh_delay: Mutex::new(Duration::from_millis(0)),
            always_unauthorized: AtomicBool::new(false),
            omit_upload_url: AtomicBool::new(false),
            storage_status: AtomicU16::new(200),
            refresh_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            upload_target_calls: AtomicUsize::new(0),
            storage_puts: AtomicUsize::new(0),
            authorization_seen: Mutex::new(Vec::new()),
            refresh_authorization_seen: Mutex::new(Vec::new()),
            last_saved: Mutex::new(None),
            stored_object: Mutex::new(None),
        }
    }
}

#[allow(dead_code)]
impl Backend {
    /// Make the server stop accepting the current access token.
    pub fn expire_access_token(&self) {
        *self.valid_access.lock() = "expired".to_string();
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_target_calls.load(Ordering::SeqCst) + self.storage_puts.load(Ordering::SeqCst)
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "msg": msg }))).into_response()
}

/// Record the call and check the bearer credential of a product route.
fn authorize(backend: &Backend, headers: &HeaderMap) -> Result<(), Response> {
    backend.api_calls.fetch_add(1, Ordering::SeqCst);
    let presented = authorization(headers);
    backend.authorization_seen.lock().push(presented.clone());

    let expected = format!("Bearer {}", backend.valid_access.lock());
    if backend.always_unauthorized.load(Ordering::SeqCst) || presented.as_deref() != Some(&expected)
    {
        return Err(message(StatusCode::UNAUTHORIZED, "Token has expired"));
    }
    Ok(())
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "admin123" {
        return Json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "user": {"id": 1, "username": "admin", "email": "admin@example.com", "role": "admin"}
        }))
        .into_response();
    }
    message(StatusCode::UNAUTHORIZED, "Invalid username or password")
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" {
        return message(StatusCode::BAD_REQUEST, "Username already exists");
    }
    message(StatusCode::CREATED, "User created successfully")
}

async fn refresh(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let calls = backend.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let presented = authorization(&headers);
    backend.refresh_authorization_seen.lock().push(presented.clone());

    let delay = *backend.refresh_delay.lock();
    tokio::time::sleep(delay).await;

    let status = backend.refresh_status.load(Ordering::SeqCst);
    let expected = format!("Bearer {}", backend.refresh_token);
    if status != 200 || presented.as_deref() != Some(&expected) {
        return message(
            StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED),
            "Token refresh failed",
        );
    }

    let minted = format!("A{}", calls + 1);
    *backend.valid_access.lock() = minted.clone();
    Json(json!({ "access_token": minted })).into_response()
}

fn sample_product(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Desk Lamp",
        "description": "Warm light",
        "price": 24.5,
        "product_image_url": "https://cdn/lamp.png",
        "created_by": 1
    })
}

async fn list_products(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    Json(json!([sample_product(1), sample_product(2)])).into_response()
}

async fn create_product(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    *backend.last_saved.lock() = Some(body);
    (
        StatusCode::CREATED,
        Json(json!({"msg": "Product created", "id": 7})),
    )
        .into_response()
}

async fn get_product(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    if id == 404 {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    Json(sample_product(id)).into_response()
}

async fn update_product(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    if id == 99 {
        return message(StatusCode::FORBIDDEN, "Not authorized to update this product");
    }
    body["id"] = json!(id);
    *backend.last_saved.lock() = Some(body);
    message(StatusCode::OK, "Product updated")
}

async fn delete_product(
    State(backend): State<Arc<Backend>>,
    Path(_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    message(StatusCode::OK, "Product deleted")
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    message(StatusCode::OK, "late")
}

async fn upload_url(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.upload_target_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authorize(&backend, &headers) {
        return response;
    }
    if backend.omit_upload_url.load(Ordering::SeqCst) {
        return Json(json!({})).into_response();
    }
    let base = backend.base_url.lock().clone();
    Json(json!({
        "uploadURL": format!(
            "{}/bucket/products/lamp.png?X-Amz-Signature=abc123&X-Amz-Expires=300",
            base
        )
    }))
    .into_response()
}

async fn storage_put(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    backend.storage_puts.fetch_add(1, Ordering::SeqCst);
    *backend.stored_object.lock() = Some(StoredObject {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
        authorization: authorization(&headers),
        bytes: body.to_vec(),
    });
    let status = StatusCode::from_u16(backend.storage_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    status.into_response()
}

/// Start the mock backend on an ephemeral port. Returns its state and base URL.
pub async fn spawn_backend() -> (Arc<Backend>, String) {
    let backend = Arc::new(Backend::default());

    let router = Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/refresh", post(refresh))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/slow", get(slow))
        .route("/upload-url", get(upload_url))
        .route("/bucket/products/lamp.png", put(storage_put))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    *backend.base_url.lock() = base_url.clone();

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    (backend, base_url)
}

/// Config pointing at the mock backend.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::for_base_url(
        &format!("{}/api", base_url),
        &format!("{}/upload-url", base_url),
    );
    config.max_upload_bytes = 64 * 1024;
    config
}

/// Client with an empty in-memory session.
#[allow(dead_code)]
pub fn test_app(base_url: &str) -> CatalogApp {
    CatalogApp::with_parts(
        test_config(base_url),
        CredentialStore::in_memory(),
        Notifier::new(),
    )
    .expect("Failed to build client")
}

/// Client already holding the `("A1", "R1")` session.
#[allow(dead_code)]
pub fn logged_in_app(base_url: &str) -> CatalogApp {
    let app = test_app(base_url);
    app.store.set(CredentialPair::new("A1", "R1"), admin_identity());
    app
}

#[allow(dead_code)]
pub fn admin_identity() -> Identity {
    Identity {
        id: Some(1),
        username: "admin".to_string(),
        email: Some("admin@example.com".to_string()),
        role: Some("admin".to_string()),
        extra: Default::default(),
    }
}
