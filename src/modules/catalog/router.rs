use axum::{Router, routing::get};

use crate::modules::catalog::controller::{
    get_courses, get_groups, get_students, get_subjects, get_teachers, get_time_slots,
};
use crate::state::AppState;

pub fn init_catalog_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(get_courses))
        .route("/groups", get(get_groups))
        .route("/subjects", get(get_subjects))
        .route("/teachers", get(get_teachers))
        .route("/time-slots", get(get_time_slots))
        .route("/students", get(get_students))
}
