//! Router-level checks that resolve before any database access.

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use tabletop_api::config::TokenSettings;
use tabletop_api::router::build_router;
use tabletop_api::state::AppState;
use tabletop_testing::auth::{MockAuth, TEST_JWT_SECRET};

fn server() -> TestServer {
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        tokens: TokenSettings::with_secret(TEST_JWT_SECRET),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn assert_envelope(body: &Value, status: StatusCode, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], code);
    assert_eq!(body["statusCode"], status.as_u16());
    assert!(body["message"].is_string(), "missing message in {body}");
}

#[tokio::test]
async fn should_answer_liveness_with_request_id() {
    let response = server().get("/healthz").await;

    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_require_bearer_token_on_console_routes() {
    let server = server();

    for path in ["/api/auth/me", "/api/admin/merchants", "/api/merchant/orders"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_envelope(&response.json::<Value>(), StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn should_reject_malformed_bearer_token() {
    let response = server()
        .get("/api/merchant/menu")
        .authorization_bearer("not-a-jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_envelope(&response.json::<Value>(), StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn should_reject_staff_token_on_customer_routes() {
    let response = server()
        .get("/api/customer/orders")
        .authorization_bearer(MockAuth::super_admin().token())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_envelope(&response.json::<Value>(), StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn should_reject_empty_checkout_body() {
    let response = server().post("/api/public/orders").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_envelope(&response.json::<Value>(), StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_reject_non_json_login_body() {
    let response = server().post("/api/auth/login").text("email=a@b.co").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_envelope(&response.json::<Value>(), StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_require_login_fields_before_lookup() {
    let response = server()
        .post("/api/auth/login")
        .json(&json!({ "email": "ada@example.com" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_envelope(&response.json::<Value>(), StatusCode::BAD_REQUEST, "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_reject_garbage_refresh_token() {
    let response = server()
        .post("/api/auth/refresh")
        .json(&json!({ "refreshToken": "garbage" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_envelope(
        &response.json::<Value>(),
        StatusCode::UNAUTHORIZED,
        "INVALID_REFRESH_TOKEN",
    );
}
