mod common;

use attendly_models::Role;
use axum::http::StatusCode;
use common::{
    TEST_PASSWORD, create_group, create_student, create_user, send, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_first_role_wins(pool: PgPool) {
    let group = create_group(&pool, "U-1").await;
    let newcomer = create_user(&pool, None).await;
    let admin = create_user(&pool, Some(Role::Admin)).await;
    let app = setup_test_app(pool.clone());
    let uri = format!("/api/users/{}/role", newcomer.id);

    let (status, body) =
        send(&app, "PATCH", &uri, Some(&admin.token), Some(json!({ "role": "student" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);
    assert_eq!(body["user"]["role"], "student");
    assert!(body["created_profile"].is_string());

    let assigned_group: Option<Uuid> =
        sqlx::query_scalar("SELECT group_id FROM students WHERE user_id = $1")
            .bind(newcomer.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(assigned_group, Some(group));

    let (status, body) =
        send(&app, "PATCH", &uri, Some(&admin.token), Some(json!({ "role": "student" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);
    assert!(body["created_profile"].is_null());

    let (status, _) =
        send(&app, "PATCH", &uri, Some(&admin.token), Some(json!({ "role": "teacher" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_assignment_links_children(pool: PgPool) {
    let group = create_group(&pool, "U-2").await;
    let (_, child) = create_student(&pool, "Child", group).await;
    let parent = create_user(&pool, None).await;
    let manager = create_user(&pool, Some(Role::Manager)).await;
    let app = setup_test_app(pool.clone());

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/users/{}/role", parent.id),
        Some(&manager.token),
        Some(json!({ "role": "parent", "children": [child] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let linked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM student_parents WHERE parent_user_id = $1 AND student_id = $2",
    )
    .bind(parent.id)
    .bind(child)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(linked, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_role_assignment_is_staff_only(pool: PgPool) {
    let newcomer = create_user(&pool, None).await;
    let teacher = create_user(&pool, Some(Role::Teacher)).await;
    let admin = create_user(&pool, Some(Role::Admin)).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/users/{}/role", newcomer.id),
        Some(&teacher.token),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/users/{}/role", Uuid::new_v4()),
        Some(&admin.token),
        Some(json!({ "role": "manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_updates_own_profile_contacts(pool: PgPool) {
    let group = create_group(&pool, "U-P").await;
    let (student, _) = create_student(&pool, "Ada", group).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/users/profile",
        Some(&student.token),
        Some(json!({
            "first_name": "  Ada ",
            "phone_number": "+1 555 0100",
            "emergency_contact_name": "Grace"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["phone_number"], "+1 555 0100");

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/users/profile",
        Some(&student.token),
        Some(json!({ "phone_number": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["phone_number"].is_null());
    assert_eq!(body["emergency_contact_name"], "Grace");

    let (status, body) = send(&app, "GET", "/api/users/profile", Some(&student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], json!(student.username));
    assert_eq!(body["role"], "student");

    let (status, _) = send(&app, "GET", "/api/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_requires_current_password(pool: PgPool) {
    let teacher = create_user(&pool, Some(Role::Teacher)).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/profile/change-password",
        Some(&teacher.token),
        Some(json!({ "current_password": "wrong-one", "new_password": "freshpass456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/profile/change-password",
        Some(&teacher.token),
        Some(json!({ "current_password": TEST_PASSWORD, "new_password": "freshpass456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let login = |password: &'static str| {
        json!({ "username": teacher.username, "password": password })
    };
    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(login(TEST_PASSWORD))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(login("freshpass456"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_username_rejects_taken_name(pool: PgPool) {
    let parent = create_user(&pool, Some(Role::Parent)).await;
    let other = create_user(&pool, Some(Role::Parent)).await;
    let app = setup_test_app(pool);
    let uri = "/api/users/profile/change-username";

    let (status, _) = send(
        &app,
        "POST",
        uri,
        Some(&parent.token),
        Some(json!({ "new_username": other.username, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        uri,
        Some(&parent.token),
        Some(json!({ "new_username": "renamed-parent", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        uri,
        Some(&parent.token),
        Some(json!({ "new_username": "renamed-parent", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "renamed-parent");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "renamed-parent", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
