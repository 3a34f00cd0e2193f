//! Common test utilities for integration tests.
//!
//! The router is built over the in-memory earnings store, so these tests
//! need no database. Tokens are minted with the HS256 test secret.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use domain::models::{Device, Gateway, GatewayStatus, PaymentStatus, Seller, Subscription};
use domain::services::MemoryEarningsStore;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use seller_portal_api::{
    app::{create_app, AppState},
    config::Config,
};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Test configuration over embedded defaults.
pub fn test_config() -> Config {
    Config::load_for_test(&[
        ("database.url", "postgres://unused@localhost/unused"),
        ("auth.jwt_secret", TEST_SECRET),
    ])
    .expect("Failed to load test config")
}

/// A router over `store`.
pub fn create_test_app(store: Arc<MemoryEarningsStore>) -> Router {
    let state = AppState::new(test_config(), store, None).expect("Failed to build app state");
    create_app(state)
}

/// A seller owning one gateway with devices `D1` and `D2`.
pub struct SeededSeller {
    pub store: Arc<MemoryEarningsStore>,
    pub seller_id: Uuid,
    pub gateway_id: Uuid,
}

pub fn seed_seller() -> SeededSeller {
    let store = Arc::new(MemoryEarningsStore::new());
    let seller_id = Uuid::new_v4();
    let gateway_id = Uuid::new_v4();

    store.insert_seller(Seller {
        id: seller_id,
        business_name: Some("Aqua Motors".to_string()),
        commission_rate: None,
        total_sales: Decimal::ZERO,
        is_approved: true,
        is_active: true,
        full_name: Some(Name().fake()),
        email: Some(SafeEmail().fake()),
        phone: Some(PhoneNumber().fake()),
        created_at: Utc::now(),
    });
    store.insert_gateway(Gateway {
        id: gateway_id,
        name: "Gateway North".to_string(),
        status: GatewayStatus::Active,
        latitude: None,
        longitude: None,
        max_devices: 16,
        seller_id: Some(seller_id),
    });
    for external_id in ["D1", "D2"] {
        store.insert_device(Device {
            id: Uuid::new_v4(),
            device_id: external_id.to_string(),
            device_name: Some(format!("Motor {}", external_id)),
            device_type: Some("water_motor".to_string()),
            motor_status: 1,
            error_status: 0,
            installation_date: None,
            last_updated: None,
            customer_name: Some(Name().fake()),
            customer_phone: Some(PhoneNumber().fake()),
            customer_email: Some(SafeEmail().fake()),
            gateway_id: Some(gateway_id),
        });
    }

    SeededSeller {
        store,
        seller_id,
        gateway_id,
    }
}

/// A completed recharge on `day` of the month at 10:00 UTC.
pub fn recharge(device_id: &str, year: i32, month: u32, day: u32, amount: &str) -> Subscription {
    let valid_from = Utc
        .with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .expect("valid date");
    Subscription {
        id: Uuid::new_v4(),
        device_id: device_id.to_string(),
        amount: Decimal::from_str(amount).expect("valid amount"),
        commission_amount: None,
        payment_status: PaymentStatus::Completed,
        plan_name: Some("Monthly Basic".to_string()),
        plan_type: Some("monthly_basic".to_string()),
        valid_from,
        valid_until: valid_from + Duration::days(30),
        seller_id: None,
    }
}

/// Mint a session token for `user_id` with `role`, expiring `ttl_secs` from now.
pub fn token_for(user_id: Uuid, role: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": user_id.to_string(),
        "role": role,
        "iat": now,
        "exp": now + ttl_secs,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to mint token")
}

pub fn seller_token(seller_id: Uuid) -> String {
    token_for(seller_id, "seller", 3600)
}

pub fn admin_token() -> String {
    token_for(Uuid::new_v4(), "admin", 3600)
}

/// Build a GET request, with a bearer token when given.
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn parse_response_body(response: Response<Body>) -> serde_json::Value {
    let body = body_bytes(response).await;
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}
