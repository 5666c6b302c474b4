use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_leave_request, decide_leave_request, get_leave_request, get_leave_requests};

pub fn init_leave_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_leave_request).get(get_leave_requests))
        .route("/{id}", get(get_leave_request).patch(decide_leave_request))
}
