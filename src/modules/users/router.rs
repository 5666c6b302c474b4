use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::modules::users::controller::{
    assign_role, change_password, change_username, get_profile, get_user, get_users,
    update_profile,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users))
        .route("/{id}", get(get_user))
        .route("/{id}/role", patch(assign_role))
}

/// Self-service routes open to every authenticated identity.
pub fn init_profile_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/profile/change-password", post(change_password))
        .route("/profile/change-username", post(change_username))
}
