#![allow(dead_code)]

use attendly::router::init_router;
use attendly::state::AppState;
use attendly_auth::create_access_token;
use attendly_config::{AttendanceConfig, CorsConfig, JwtConfig};
use attendly_core::password::hash_password;
use attendly_models::{Role, Weekday};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveTime;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "testpass123";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    let state = AppState {
        db: pool,
        jwt_config: jwt_config(),
        cors_config: CorsConfig::from_env(),
        attendance_config: AttendanceConfig::default(),
    };
    init_router(state)
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn create_user(pool: &PgPool, role: Option<Role>) -> TestUser {
    let username = unique(role.map(|r| r.as_str()).unwrap_or("user"));
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (username, first_name, last_name, password, role)
         VALUES ($1, 'Test', $1, $2, $3) RETURNING id",
    )
    .bind(&username)
    .bind(hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    let token =
        create_access_token(id, &username, role.map(|r| r.as_str()), &jwt_config()).unwrap();

    TestUser {
        id,
        username,
        token,
    }
}

pub async fn create_group(pool: &PgPool, name: &str) -> Uuid {
    let course_id: Uuid =
        sqlx::query_scalar("INSERT INTO courses (name, year) VALUES ($1, 1) RETURNING id")
            .bind(unique("Course"))
            .fetch_one(pool)
            .await
            .unwrap();

    sqlx::query_scalar("INSERT INTO groups (name, course_id) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(course_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// A teacher profile linked to a fresh identity.
pub async fn create_teacher(pool: &PgPool) -> (TestUser, Uuid) {
    let user = create_user(pool, Some(Role::Teacher)).await;
    let teacher_id: Uuid = sqlx::query_scalar(
        "INSERT INTO teachers (user_id, full_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(user.id)
    .bind(&user.username)
    .fetch_one(pool)
    .await
    .unwrap();
    (user, teacher_id)
}

pub async fn create_subject(pool: &PgPool, name: &str, teacher_id: Uuid) -> Uuid {
    sqlx::query_scalar("INSERT INTO subjects (name, teacher_id) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(teacher_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_time_slot(pool: &PgPool, sequence: i16) -> Uuid {
    let start = NaiveTime::from_hms_opt(8 + sequence as u32, 0, 0).unwrap();
    let end = NaiveTime::from_hms_opt(8 + sequence as u32, 50, 0).unwrap();
    sqlx::query_scalar(
        "INSERT INTO time_slots (name, start_time, end_time, sequence) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(format!("Period {sequence}"))
    .bind(start)
    .bind(end)
    .bind(sequence)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A student profile linked to a fresh identity.
pub async fn create_student(pool: &PgPool, name: &str, group_id: Uuid) -> (TestUser, Uuid) {
    let user = create_user(pool, Some(Role::Student)).await;
    let student_id: Uuid = sqlx::query_scalar(
        "INSERT INTO students (user_id, full_name, group_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user.id)
    .bind(name)
    .bind(group_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (user, student_id)
}

pub async fn create_slot(
    pool: &PgPool,
    subject_id: Uuid,
    teacher_id: Uuid,
    group_id: Uuid,
    day: Weekday,
    time_slot_id: Uuid,
) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO schedule_slots (subject_id, teacher_id, group_id, day_of_week, time_slot_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(subject_id)
    .bind(teacher_id)
    .bind(group_id)
    .bind(day)
    .bind(time_slot_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Sends one request through the router and returns the status and JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
