use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use attendly_core::AppError;

use crate::middleware::auth::{AuthUser, CurrentProfile};
use crate::modules::catalog::model::{
    Course, Group, GroupFilterParams, PaginatedStudentsResponse, StudentFilterParams, Subject,
    SubjectFilterParams, Teacher, TimeSlot,
};
use crate::modules::catalog::service::CatalogService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/catalog/courses",
    responses(
        (status = 200, description = "Courses", body = Vec<Course>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(CatalogService::courses(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/groups",
    params(GroupFilterParams),
    responses(
        (status = 200, description = "Groups with their course and size", body = Vec<Group>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_groups(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<GroupFilterParams>,
) -> Result<Json<Vec<Group>>, AppError> {
    Ok(Json(CatalogService::groups(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/subjects",
    params(SubjectFilterParams),
    responses(
        (status = 200, description = "Subjects", body = Vec<Subject>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_subjects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<SubjectFilterParams>,
) -> Result<Json<Vec<Subject>>, AppError> {
    Ok(Json(CatalogService::subjects(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/catalog/teachers",
    responses(
        (status = 200, description = "Teachers", body = Vec<Teacher>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teachers(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<Teacher>>, AppError> {
    Ok(Json(CatalogService::teachers(&state.db).await?))
}

/// Active periods ordered by sequence
#[utoipa::path(
    get,
    path = "/api/catalog/time-slots",
    responses(
        (status = 200, description = "Active periods", body = Vec<TimeSlot>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_time_slots(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    Ok(Json(CatalogService::time_slots(&state.db).await?))
}

/// Students visible to the caller
///
/// Staff and teachers see every student, students see themselves and parents
/// see their linked children.
#[utoipa::path(
    get,
    path = "/api/catalog/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Students", body = PaginatedStudentsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Catalog",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let students = CatalogService::students(&state.db, &profile, filters).await?;
    Ok(Json(students))
}
