use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/schedules", post(handlers::schedule::create_schedule))
        .route("/api/schedules", get(handlers::schedule::list_schedules))
        .route(
            "/api/schedules/bulk",
            post(handlers::schedule::create_bulk_schedules),
        )
        .route("/api/schedules/:id", get(handlers::schedule::get_schedule))
        .route(
            "/api/schedules/:id",
            delete(handlers::schedule::delete_schedule),
        )
        .route(
            "/api/schedules/:id/status",
            put(handlers::schedule::update_schedule_status),
        )
        .route(
            "/api/schedules/:id/bookings",
            get(handlers::booking::list_bookings_for_schedule),
        )
        .route(
            "/api/schedules/:id/approve-all",
            post(handlers::booking::approve_all_bookings),
        )
        .route(
            "/api/schedules/:id/reject-all",
            post(handlers::booking::reject_all_bookings),
        )
}
