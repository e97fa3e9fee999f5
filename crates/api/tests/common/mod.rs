//! Shared harness for the API integration tests: app construction with the
//! production middleware stack, request helpers, and catalog seeding.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use cinebook_api::auth::jwt::{generate_access_token, JwtConfig};
use cinebook_api::config::ServerConfig;
use cinebook_api::payment::vnpay::VnpayConfig;
use cinebook_api::router::build_app_router;
use cinebook_api::state::AppState;
use cinebook_core::config::BookingConfig;
use cinebook_core::qr::QrKeys;
use cinebook_core::types::DbId;
use cinebook_db::repositories::{CatalogRepo, ShowtimeRepo};

/// VNPay secret the test state signs and verifies with.
pub const TEST_VNPAY_SECRET: &str = "vnpay-test-secret";

/// Build a test `ServerConfig` with safe defaults and a known JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// QR keys the test state issues and opens tokens with.
pub fn test_qr_keys() -> QrKeys {
    QrKeys::new(b"test-qr-signing-key".to_vec(), [7u8; 32])
}

pub fn test_vnpay_config() -> VnpayConfig {
    VnpayConfig {
        tmn_code: "CINEBOOK".to_string(),
        hash_secret: TEST_VNPAY_SECRET.to_string(),
        pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
        return_url: "http://localhost:5173/payment/result".to_string(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Mirrors `main.rs` so integration tests exercise the same middleware
/// stack (CORS, request ID, timeout, tracing, panic recovery) that
/// production uses. E-mail stays disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        booking: BookingConfig::default(),
        qr_keys: Arc::new(test_qr_keys()),
        vnpay: Arc::new(test_vnpay_config()),
        email: None,
    };
    build_app_router(state, &config)
}

/// A Bearer token for a box-office staff user.
pub fn staff_token() -> String {
    generate_access_token(1, "staff", &test_config().jwt).unwrap()
}

/// A Bearer token for a plain customer.
pub fn customer_token(user_id: DbId) -> String {
    generate_access_token(user_id, "customer", &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    request(app, "GET", uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    request(app, "GET", uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    request(app, "POST", uri, Some(body), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    request(app, "POST", uri, Some(body), Some(token)).await
}

async fn request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// A seeded screening: one room of four standard chairs at 100000 VND,
/// one combo at 50000 VND, starting two hours from now.
pub struct Fixture {
    pub showtime_id: DbId,
    pub chair_ids: Vec<DbId>,
    pub combo_id: DbId,
}

pub async fn seed_showtime(pool: &PgPool) -> Fixture {
    let movie_id = CatalogRepo::create_movie(pool, "Interstellar", 169)
        .await
        .unwrap();
    let room_id = CatalogRepo::create_room(pool, "Room 1").await.unwrap();
    let chair_type_id = CatalogRepo::create_chair_type(pool, "standard", 100_000)
        .await
        .unwrap();

    let mut chair_ids = Vec::new();
    for label in ["A1", "A2", "A3", "A4"] {
        chair_ids.push(
            CatalogRepo::create_chair(pool, room_id, chair_type_id, label)
                .await
                .unwrap(),
        );
    }

    let showtime =
        ShowtimeRepo::schedule(pool, movie_id, room_id, Utc::now() + Duration::hours(2), 15)
            .await
            .unwrap();

    let combo_id = CatalogRepo::create_combo(pool, "Popcorn + Coke", 50_000)
        .await
        .unwrap();

    Fixture {
        showtime_id: showtime.id,
        chair_ids,
        combo_id,
    }
}

/// JSON body for a guest order over the given chairs at version 0
/// (fresh ledger rows).
pub fn guest_order_body(showtime_id: DbId, chair_ids: &[DbId]) -> serde_json::Value {
    let seats: Vec<serde_json::Value> = chair_ids
        .iter()
        .map(|id| serde_json::json!({ "chair_id": id, "version": 0 }))
        .collect();
    serde_json::json!({
        "showtime_id": showtime_id,
        "seats": seats,
        "contact": {
            "name": "Linh Tran",
            "phone": "0901234567",
            "email": "linh@example.com"
        }
    })
}
