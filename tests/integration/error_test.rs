//! Integration tests for authentication and the error body shape.

use axum::http::StatusCode;
use schoolhub_entity::user::UserRole;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/credits/balance", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/users/me", None, Some("not-a-jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_is_locked_out() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    let me = app.request("GET", "/api/users/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["id"], user.id.to_string());

    let admin = app.create_user(UserRole::Admin, None).await;
    let deactivated = app
        .request(
            "DELETE",
            &format!("/api/admin/users/{}", user.id),
            None,
            Some(&app.token_for(&admin)),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK, "{:?}", deactivated.body);

    let me = app.request("GET", "/api/users/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validation_error_shape() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;

    let response = app
        .request(
            "POST",
            "/api/credits/deduct",
            Some(serde_json::json!({ "amount": 0, "reason": "" })),
            Some(&app.token_for(&user)),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(
        response.body["message"]
            .as_str()
            .is_some_and(|m| m.contains("amount"))
    );
}

#[tokio::test]
async fn test_health_reports_memory_backend() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["backend"], "memory");
}
