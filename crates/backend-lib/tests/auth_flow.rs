//! End-to-end flow through the HTTP router.
mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use larder_backend_lib::{router::create_router, scheduler::ScanScheduler};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        },
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, email: &str) -> (u64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Alex", "email": email, "password": "Pantry#2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "Pantry#2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["id"], user["id"]);

    (
        user["id"].as_u64().unwrap(),
        login["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_needs_no_token() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_use_protected_routes() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (id, token) = register_and_login(&app, "Alex@Example.com").await;

    let (status, me) = send(&app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id);
    assert_eq!(me["email"], "alex@example.com");
    assert_eq!(me["has_delivery_target"], false);
    assert!(me.get("password_hash").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/user/delivery-target",
        Some(&token),
        Some(json!({ "target": "device-token-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = send(&app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(me["has_delivery_target"], true);

    let (status, role) = send(&app, Method::GET, "/api/auth/isadmin", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["is_admin"], false);
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);

    let (missing_status, missing) = send(&app, Method::GET, "/api/user", None, None).await;
    let (bad_status, bad) = send(&app, Method::GET, "/api/user", Some("abc.def.ghi"), None).await;

    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, bad);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    register_and_login(&app, "alex@example.com").await;

    let (s1, wrong_password) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alex@example.com", "password": "Pantry#2025" })),
    )
    .await;
    let (s2, unknown_email) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "Pantry#2024" })),
    )
    .await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    register_and_login(&app, "alex@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Other", "email": " ALEX@example.com", "password": "Pantry#2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT_001");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "alex@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let (state, storage, notifier) = common::test_state();
    let app = create_router(state);
    let (member_id, member_token) = register_and_login(&app, "member@example.com").await;
    let (admin_id, admin_token) = register_and_login(&app, "admin@example.com").await;
    storage.set_admin(admin_id, true).unwrap();

    let (status, _) = send(&app, Method::GET, "/api/admin/users", Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = send(&app, Method::GET, "/api/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (_, role) = send(&app, Method::GET, "/api/auth/isadmin", Some(&admin_token), None).await;
    assert_eq!(role["is_admin"], true);

    // No delivery target yet
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/send-notification",
        Some(&admin_token),
        Some(json!({ "user_id": member_id, "message": "Fridge check tonight" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        Method::POST,
        "/api/user/delivery-target",
        Some(&member_token),
        Some(json!({ "target": "member-device" })),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/send-notification",
        Some(&admin_token),
        Some(json!({ "user_id": member_id, "message": "Fridge check tonight" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/send-notification",
        Some(&admin_token),
        Some(json!({ "user_id": 999, "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "member-device");
    assert_eq!(sent[0].1.title, "Grocery Notification");
    assert_eq!(sent[0].1.body, "Fridge check tonight");
}

#[tokio::test]
async fn configured_admin_email_can_use_admin_routes() {
    let (state, _, _) = common::test_state_with_admins(&["owner@example.com"]);
    let app = create_router(state);
    let (_, owner_token) = register_and_login(&app, "Owner@Example.com").await;
    let (_, member_token) = register_and_login(&app, "member@example.com").await;

    let (status, users) = send(&app, Method::GET, "/api/admin/users", Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users[0]["is_admin"], true);
    assert_eq!(users[1]["is_admin"], false);

    let (status, _) = send(&app, Method::GET, "/api/admin/users", Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn groceries_are_stored_per_user() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (id, token) = register_and_login(&app, "alex@example.com").await;
    let (_, other_token) = register_and_login(&app, "sam@example.com").await;
    let now = Utc::now();

    let (status, rice) = send(
        &app,
        Method::POST,
        "/api/groceries",
        Some(&token),
        Some(json!({
            "name": " Rice ",
            "quantity": 2.0,
            "unit": "kg",
            "expiry_date": now + Duration::days(30),
            "storage_location": "dry_pantry"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rice["name"], "Rice");
    assert_eq!(rice["user_id"], id);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/groceries",
        Some(&token),
        Some(json!({
            "name": "Milk",
            "expiry_date": now + Duration::days(2),
            "storage_location": "refrigerator"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, items) = send(&app, Method::GET, "/api/groceries", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Milk", "Rice"]);

    let (_, expiring) = send(&app, Method::GET, "/api/groceries/expiring", Some(&token), None).await;
    assert_eq!(expiring.as_array().unwrap().len(), 1);
    assert_eq!(expiring[0]["name"], "Milk");

    let (_, month) = send(&app, Method::GET, "/api/groceries/expiring?days=31", Some(&token), None).await;
    assert_eq!(month.as_array().unwrap().len(), 2);

    let (_, others) = send(&app, Method::GET, "/api/groceries", Some(&other_token), None).await;
    assert!(others.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_groceries_are_rejected() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (_, token) = register_and_login(&app, "alex@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/groceries",
        Some(&token),
        Some(json!({
            "name": "Old bread",
            "expiry_date": Utc::now() - Duration::days(1),
            "storage_location": "dry_pantry"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VAL_001");

    let (status, _) = send(&app, Method::GET, "/api/groceries/expiring?days=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/groceries/expiring?days=soon", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/groceries", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_replaces_the_credential() {
    let (state, _, _) = common::test_state();
    let app = create_router(state);
    let (_, token) = register_and_login(&app, "alex@example.com").await;
    register_and_login(&app, "sam@example.com").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/user",
        Some(&token),
        Some(json!({ "email": "sam@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT_001");

    let (status, me) = send(
        &app,
        Method::PUT,
        "/api/user",
        Some(&token),
        Some(json!({ "name": "Alexis", "email": "Alexis@Example.com", "password": "Larder!2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Alexis");
    assert_eq!(me["email"], "alexis@example.com");
    assert!(me.get("password_hash").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alexis@example.com", "password": "Pantry#2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alex@example.com", "password": "Larder!2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "alexis@example.com", "password": "Larder!2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/user",
        Some(&token),
        Some(json!({ "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn items_added_over_http_reach_the_scan() {
    let (state, storage, notifier) = common::test_state();
    let app = create_router(state);
    let (_, token) = register_and_login(&app, "alex@example.com").await;

    send(
        &app,
        Method::POST,
        "/api/user/delivery-target",
        Some(&token),
        Some(json!({ "target": "alex-device" })),
    )
    .await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/groceries",
        Some(&token),
        Some(json!({
            "name": "Yoghurt",
            "expiry_date": Utc::now() + Duration::hours(10),
            "storage_location": "refrigerator"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let scheduler = ScanScheduler::new(
        storage.clone(),
        storage.clone(),
        notifier.clone(),
        &Default::default(),
    );
    let report = scheduler.run_scan(Duration::days(1), Utc::now()).await.unwrap();
    assert_eq!(report.notified, 1);

    let sent = notifier.sent();
    assert_eq!(sent[0].0, "alex-device");
    assert!(sent[0].1.body.starts_with("Yoghurt is expiring on "));
}
