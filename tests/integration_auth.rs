mod common;

use attendly_models::Role;
use axum::http::StatusCode;
use common::{TEST_PASSWORD, create_group, create_student, create_user, send, setup_test_app};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, Some(Role::Teacher)).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": user.username, "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["username"], json!(user.username));
    assert_eq!(body["user"]["role"], "teacher");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_invalid_credentials(pool: PgPool) {
    let user = create_user(&pool, None).await;
    let app = setup_test_app(pool);

    let (status, wrong_password) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": user.username, "password": "wrongpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody-here", "password": "wrongpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["error"], unknown_user["error"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_validation(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_linked_profile(pool: PgPool) {
    let group = create_group(&pool, "M-1").await;
    let (student, student_id) = create_student(&pool, "Aida", group).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], json!(student.id));
    assert_eq!(body["student_id"], json!(student_id));
    assert_eq!(body["group_id"], json!(group));

    let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
