use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    delete_notification, get_notifications, mark_all_notifications_read, mark_notification_read,
};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/read-all", post(mark_all_notifications_read))
        .route("/{id}/read", post(mark_notification_read))
        .route("/{id}", delete(delete_notification))
}
