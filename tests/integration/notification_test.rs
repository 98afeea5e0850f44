//! Integration tests for notification publishing and read state.

use axum::http::StatusCode;
use schoolhub_entity::user::UserRole;
use uuid::Uuid;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_direct_notification_read_toggle() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let student = app.create_user(UserRole::Student, None).await;
    let student_token = app.token_for(&student);

    let published = app
        .request(
            "POST",
            "/api/notifications",
            Some(serde_json::json!({
                "title": "Exam schedule",
                "titleBn": "পরীক্ষার সময়সূচি",
                "message": "Half-yearly exams start on Sunday.",
                "type": "info",
                "category": "academic",
                "recipientId": student.id,
            })),
            Some(&app.token_for(&admin)),
        )
        .await;
    assert_eq!(published.status, StatusCode::CREATED, "{:?}", published.body);
    let id = published.body["data"]["id"].as_str().unwrap().to_string();

    let unread = app
        .request(
            "GET",
            "/api/notifications?unreadOnly=true",
            None,
            Some(&student_token),
        )
        .await;
    assert_eq!(unread.status, StatusCode::OK);
    assert_eq!(unread.body["data"]["totalItems"], 1);
    assert_eq!(unread.body["data"]["items"][0]["isRead"], false);

    let read = app
        .request(
            "PUT",
            &format!("/api/notifications/{id}/read"),
            Some(serde_json::json!({ "isRead": true })),
            Some(&student_token),
        )
        .await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["data"]["isRead"], true);

    let count = app
        .request("GET", "/api/notifications/unread-count", None, Some(&student_token))
        .await;
    assert_eq!(count.body["data"]["count"], 0);

    let unread_again = app
        .request(
            "PUT",
            &format!("/api/notifications/{id}/read"),
            Some(serde_json::json!({ "isRead": false })),
            Some(&student_token),
        )
        .await;
    assert_eq!(unread_again.body["data"]["isRead"], false);
}

#[tokio::test]
async fn test_direct_notification_hidden_from_others() {
    let app = TestApp::new();
    let admin = app.create_user(UserRole::Admin, None).await;
    let recipient = app.create_user(UserRole::Student, None).await;
    let bystander = app.create_user(UserRole::Student, None).await;

    let published = app
        .request(
            "POST",
            "/api/notifications",
            Some(serde_json::json!({
                "title": "Fee reminder",
                "message": "Tuition for March is due.",
                "recipientId": recipient.id,
            })),
            Some(&app.token_for(&admin)),
        )
        .await;
    let id = published.body["data"]["id"].as_str().unwrap().to_string();
    let bystander_token = app.token_for(&bystander);

    let list = app
        .request("GET", "/api/notifications", None, Some(&bystander_token))
        .await;
    assert_eq!(list.body["data"]["totalItems"], 0);

    let toggle = app
        .request(
            "PUT",
            &format!("/api/notifications/{id}/read"),
            Some(serde_json::json!({ "isRead": true })),
            Some(&bystander_token),
        )
        .await;
    assert_eq!(toggle.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_teacher_broadcast_stays_in_school() {
    let app = TestApp::new();
    let school = Uuid::new_v4();
    let teacher = app.create_user(UserRole::Teacher, Some(school)).await;
    let classmate = app.create_user(UserRole::Student, Some(school)).await;
    let elsewhere = app.create_user(UserRole::Student, Some(Uuid::new_v4())).await;

    let published = app
        .request(
            "POST",
            "/api/notifications",
            Some(serde_json::json!({
                "title": "Sports day",
                "message": "Sports day is on Thursday.",
                "recipientRole": "student",
            })),
            Some(&app.token_for(&teacher)),
        )
        .await;
    assert_eq!(published.status, StatusCode::CREATED, "{:?}", published.body);
    assert_eq!(published.body["data"]["schoolId"], school.to_string());

    let seen = app
        .request("GET", "/api/notifications", None, Some(&app.token_for(&classmate)))
        .await;
    assert_eq!(seen.body["data"]["totalItems"], 1);

    let unseen = app
        .request("GET", "/api/notifications", None, Some(&app.token_for(&elsewhere)))
        .await;
    assert_eq!(unseen.body["data"]["totalItems"], 0);
}

#[tokio::test]
async fn test_students_cannot_publish() {
    let app = TestApp::new();
    let student = app.create_user(UserRole::Student, None).await;

    let response = app
        .request(
            "POST",
            "/api/notifications",
            Some(serde_json::json!({ "title": "Hi", "message": "Hello" })),
            Some(&app.token_for(&student)),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_teacher_without_school_cannot_broadcast() {
    let app = TestApp::new();
    let teacher = app.create_user(UserRole::Teacher, None).await;
    let student = app.create_user(UserRole::Student, Some(Uuid::new_v4())).await;

    let response = app
        .request(
            "POST",
            "/api/notifications",
            Some(serde_json::json!({
                "title": "Holiday",
                "message": "School is closed tomorrow.",
            })),
            Some(&app.token_for(&teacher)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let list = app
        .request("GET", "/api/notifications", None, Some(&app.token_for(&student)))
        .await;
    assert_eq!(list.body["data"]["totalItems"], 0);
}
