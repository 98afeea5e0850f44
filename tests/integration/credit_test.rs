//! Integration tests for the credit ledger endpoints.

use axum::http::StatusCode;
use schoolhub_entity::user::UserRole;
use uuid::Uuid;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_balance_of_new_user() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    let response = app
        .request("GET", "/api/credits/balance", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["currentCredits"], 100);
    assert_eq!(response.body["data"]["initialCredits"], 100);
    assert_eq!(response.body["data"]["usedCredits"], 0);
}

#[tokio::test]
async fn test_missing_balance_is_not_found() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let token = app.token_for(&admin);

    let response = app
        .request(
            "GET",
            &format!("/api/credits/balance?userId={}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_teacher_cannot_read_other_balances() {
    let app = TestApp::new();
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let other = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&teacher);

    let response = app
        .request(
            "GET",
            &format!("/api/credits/balance?userId={}", other.id),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deduct_records_transaction() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    let response = app
        .request(
            "POST",
            "/api/credits/deduct",
            Some(serde_json::json!({ "amount": 30, "reason": "Bulk SMS" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["balance"]["currentCredits"], 70);
    assert_eq!(response.body["data"]["transaction"]["amount"], -30);
    assert_eq!(response.body["data"]["transaction"]["balanceAfter"], 70);

    let history = app
        .request("GET", "/api/credits/transactions", None, Some(&token))
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["data"]["totalItems"], 1);
    assert_eq!(history.body["data"]["items"][0]["reason"], "Bulk SMS");
}

#[tokio::test]
async fn test_deduct_beyond_balance_is_payment_required() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    let response = app
        .request(
            "POST",
            "/api/credits/deduct",
            Some(serde_json::json!({ "amount": 101, "reason": "Too much" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.body["error"], "INSUFFICIENT_CREDITS");
    assert_eq!(app.current_credits(&user).await, 100);
}

#[tokio::test]
async fn test_concurrent_deducts_never_overdraw() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    let setup = app
        .request(
            "POST",
            "/api/credits/deduct",
            Some(serde_json::json!({ "amount": 90, "reason": "setup" })),
            Some(&token),
        )
        .await;
    assert_eq!(setup.status, StatusCode::OK);

    let body = serde_json::json!({ "amount": 6, "reason": "Report card" });
    let (first, second) = tokio::join!(
        app.request("POST", "/api/credits/deduct", Some(body.clone()), Some(&token)),
        app.request("POST", "/api/credits/deduct", Some(body.clone()), Some(&token)),
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::PAYMENT_REQUIRED]);
    assert_eq!(app.current_credits(&user).await, 4);
}

#[tokio::test]
async fn test_top_up_is_idempotent_per_transaction_id() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);
    let body = serde_json::json!({
        "amount": 50,
        "paymentMethod": "bkash",
        "externalTransactionId": "BK-2024-0001",
    });

    let first = app
        .request("POST", "/api/credits/topup", Some(body.clone()), Some(&token))
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);
    assert_eq!(first.body["data"]["outcome"], "credited");

    let replay = app
        .request("POST", "/api/credits/topup", Some(body), Some(&token))
        .await;
    assert_eq!(replay.status, StatusCode::OK);
    assert_eq!(replay.body["data"]["outcome"], "duplicate");
    assert_eq!(
        replay.body["data"]["payment"]["id"],
        first.body["data"]["payment"]["id"]
    );

    assert_eq!(app.current_credits(&user).await, 150);
}

#[tokio::test]
async fn test_top_up_for_another_user_requires_admin() {
    let app = TestApp::new();
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let other = app.create_user(UserRole::Student, None).await;
    let body = serde_json::json!({
        "amount": 20,
        "paymentMethod": "nagad",
        "externalTransactionId": "NG-77",
        "userId": other.id,
    });

    let response = app
        .request(
            "POST",
            "/api/credits/topup",
            Some(body.clone()),
            Some(&app.token_for(&teacher)),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let admin = app.create_user(UserRole::Admin, None).await;
    let response = app
        .request("POST", "/api/credits/topup", Some(body), Some(&app.token_for(&admin)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.current_credits(&other).await, 120);
}

#[tokio::test]
async fn test_oversized_top_up_is_rejected() {
    let app = TestApp::new();
    let user = app.create_user(UserRole::Teacher, None).await;
    let token = app.token_for(&user);

    for amount in [2_000_000_000_i64, i64::MAX] {
        let response = app
            .request(
                "POST",
                "/api/credits/topup",
                Some(serde_json::json!({
                    "amount": amount,
                    "paymentMethod": "bkash",
                    "externalTransactionId": format!("BIG-{amount}"),
                })),
                Some(&token),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"], "VALIDATION_ERROR");
    }
    assert_eq!(app.current_credits(&user).await, 100);
}

#[tokio::test]
async fn test_reused_transaction_id_is_conflict() {
    let app = TestApp::new();
    let owner = app.create_user(UserRole::Teacher, None).await;
    let other = app.create_user(UserRole::Student, None).await;

    let first = app
        .request(
            "POST",
            "/api/credits/topup",
            Some(serde_json::json!({
                "amount": 500,
                "paymentMethod": "bkash",
                "externalTransactionId": "TX-1",
            })),
            Some(&app.token_for(&owner)),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);

    let reused = app
        .request(
            "POST",
            "/api/credits/topup",
            Some(serde_json::json!({
                "amount": 10,
                "paymentMethod": "bkash",
                "externalTransactionId": "TX-1",
            })),
            Some(&app.token_for(&other)),
        )
        .await;
    assert_eq!(reused.status, StatusCode::CONFLICT);
    assert_eq!(reused.body["error"], "CONFLICT");
    assert!(reused.body.get("data").is_none());

    assert_eq!(app.current_credits(&owner).await, 600);
    assert_eq!(app.current_credits(&other).await, 100);
}
