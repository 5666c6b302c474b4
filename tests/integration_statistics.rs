mod common;

use attendly_models::Role;
use axum::http::StatusCode;
use common::{
    create_group, create_student, create_subject, create_teacher, create_user, send,
    setup_test_app,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn record(pool: &PgPool, student: Uuid, subject: Uuid, date: &str, status: &str) {
    sqlx::query(
        "INSERT INTO attendance_records (student_id, subject_id, date, status)
         VALUES ($1, $2, $3::date, $4::attendance_status)",
    )
    .bind(student)
    .bind(subject)
    .bind(date)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_stats_only_count_their_subjects(pool: PgPool) {
    let group = create_group(&pool, "S-1").await;
    let (teacher, teacher_id) = create_teacher(&pool).await;
    let (_, other_teacher) = create_teacher(&pool).await;
    let math = create_subject(&pool, "Math", teacher_id).await;
    let physics = create_subject(&pool, "Physics", other_teacher).await;
    let (_, first) = create_student(&pool, "First", group).await;
    let (_, second) = create_student(&pool, "Second", group).await;

    record(&pool, first, math, "2024-09-02", "present").await;
    record(&pool, second, math, "2024-09-02", "absent").await;
    record(&pool, first, physics, "2024-09-02", "absent").await;
    record(&pool, second, physics, "2024-09-03", "absent").await;
    record(&pool, second, physics, "2024-09-04", "late").await;

    let admin = create_user(&pool, Some(Role::Admin)).await;
    let app = setup_test_app(pool);
    let uri = format!("/api/stats?group={group}");

    let (status, body) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["total"], 2);
    assert_eq!(body["overall"]["present"], 1);
    assert_eq!(body["overall"]["absent"], 1);
    assert_eq!(body["overall"]["present_rate"], 50.0);
    assert!(body["group_breakdown"].is_null());
    assert_eq!(body["top_absent"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(&app, "GET", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["total"], 5);
    assert_eq!(body["weekly_trend"].as_array().map(Vec::len), Some(7));
    assert!(body["group_breakdown"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_stats_are_their_own_and_reversed_range_is_rejected(pool: PgPool) {
    let group = create_group(&pool, "S-2").await;
    let (_, teacher_id) = create_teacher(&pool).await;
    let math = create_subject(&pool, "Math", teacher_id).await;
    let (me, my_id) = create_student(&pool, "Me", group).await;
    let (_, other) = create_student(&pool, "Other", group).await;

    record(&pool, my_id, math, "2024-09-02", "late").await;
    record(&pool, other, math, "2024-09-02", "absent").await;

    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/stats?student={other}"),
        Some(&me.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["total"], 1);
    assert_eq!(body["overall"]["late"], 1);
    assert_eq!(body["students_in_scope"], 1);
    assert!(body["top_absent"].is_null());

    let (status, _) = send(
        &app,
        "GET",
        "/api/stats?from=2024-09-10&to=2024-09-01",
        Some(&me.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unassigned_identity_sees_zeroes(pool: PgPool) {
    let nobody = create_user(&pool, None).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/stats", Some(&nobody.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"]["total"], 0);
    assert_eq!(body["overall"]["present_rate"], 0.0);
    assert_eq!(body["students_in_scope"], 0);
}
