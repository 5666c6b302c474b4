use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_schedule_slot, get_my_schedule, get_roster, get_schedule, get_schedule_slot,
    get_today_schedule, reactivate_schedule_slot, retire_schedule_slot, update_schedule_slot,
};

pub fn init_schedule_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_schedule).post(create_schedule_slot))
        .route("/mine", get(get_my_schedule))
        .route("/today", get(get_today_schedule))
        .route("/{id}", get(get_schedule_slot).put(update_schedule_slot))
        .route("/{id}/retire", post(retire_schedule_slot))
        .route("/{id}/reactivate", post(reactivate_schedule_slot))
        .route("/{id}/roster", get(get_roster))
}
