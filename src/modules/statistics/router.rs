use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_dashboard, get_group_stats, get_stats};

pub fn init_statistics_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_stats))
        .route("/dashboard", get(get_dashboard))
        .route("/groups/{id}", get(get_group_stats))
}
