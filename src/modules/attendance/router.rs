use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    amend_attendance, amend_many_attendance, get_attendance, get_attendance_audit,
    get_attendance_history, mark_bulk_attendance,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_attendance))
        .route("/bulk", post(mark_bulk_attendance))
        .route("/amend-many", post(amend_many_attendance))
        .route("/history", get(get_attendance_history))
        .route("/{id}/amend", post(amend_attendance))
        .route("/{id}/audit", get(get_attendance_audit))
}
