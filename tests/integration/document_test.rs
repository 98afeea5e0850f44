//! Integration tests for templates and the generation gate.

use axum::http::StatusCode;
use schoolhub_entity::user::{User, UserRole};

use crate::helpers::TestApp;

async fn create_template(app: &TestApp, admin: &User, credit_cost: i64) -> String {
    let response = app
        .request(
            "POST",
            "/api/documents/templates",
            Some(serde_json::json!({
                "name": format!("Admit Card {credit_cost}"),
                "category": "admit_card",
                "templateType": "student",
                "fields": [
                    { "name": "student_name", "label": "Name", "required": true },
                    { "name": "roll_number", "label": "Roll", "fieldType": "number", "required": true },
                ],
                "layout": "<h1>{{student_name}}</h1><p>Roll {{roll_number}}</p>",
                "creditCost": credit_cost,
            })),
            Some(&app.token_for(admin)),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["data"]["id"]
        .as_str()
        .expect("template id missing")
        .to_string()
}

#[tokio::test]
async fn test_generation_charges_template_cost() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let template_id = create_template(&app, &admin, 5).await;
    let token = app.token_for(&teacher);

    let response = app
        .request(
            "POST",
            "/api/documents/generate",
            Some(serde_json::json!({
                "templateId": template_id,
                "inputData": { "student_name": "Ayesha Siddiqua", "roll_number": 12 },
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["data"]["status"], "completed");
    assert_eq!(response.body["data"]["creditsCharged"], 5);
    assert!(response.body["data"]["fileUrl"].is_string());
    assert_eq!(app.current_credits(&teacher).await, 95);

    let document_id = response.body["data"]["id"].as_str().unwrap().to_string();
    let fetched = app
        .request("GET", &format!("/api/documents/{document_id}"), None, Some(&token))
        .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["id"], document_id.as_str());
}

#[tokio::test]
async fn test_generation_without_credits_is_rejected() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let template_id = create_template(&app, &admin, 150).await;
    let token = app.token_for(&teacher);

    let response = app
        .request(
            "POST",
            "/api/documents/generate",
            Some(serde_json::json!({
                "templateId": template_id,
                "inputData": { "student_name": "Tanvir", "roll_number": 3 },
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.body["error"], "INSUFFICIENT_CREDITS");
    assert_eq!(app.current_credits(&teacher).await, 100);

    let documents = app
        .request("GET", "/api/documents", None, Some(&token))
        .await;
    assert_eq!(documents.body["data"]["totalItems"], 0);
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_charging() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let template_id = create_template(&app, &admin, 5).await;

    let response = app
        .request(
            "POST",
            "/api/documents/generate",
            Some(serde_json::json!({
                "templateId": template_id,
                "inputData": { "roll_number": "twelve" },
            })),
            Some(&app.token_for(&teacher)),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(app.current_credits(&teacher).await, 100);
}

#[tokio::test]
async fn test_teachers_cannot_create_templates() {
    let app = TestApp::new();
    let teacher = app.create_user(UserRole::Teacher, None).await;

    let response = app
        .request(
            "POST",
            "/api/documents/templates",
            Some(serde_json::json!({
                "name": "Certificate",
                "category": "certificate",
                "templateType": "student",
                "layout": "<p>Hello</p>",
                "creditCost": 1,
            })),
            Some(&app.token_for(&teacher)),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
