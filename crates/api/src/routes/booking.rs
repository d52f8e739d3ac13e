use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::booking::book_duty))
        .route(
            "/api/bookings/pending",
            get(handlers::booking::list_pending_bookings),
        )
        .route("/api/bookings/stats", get(handlers::booking::booking_stats))
        .route(
            "/api/bookings/statistics",
            get(handlers::booking::student_duty_stats),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route(
            "/api/bookings/:id/complete",
            post(handlers::booking::complete_duty),
        )
        .route(
            "/api/bookings/:id/approve",
            post(handlers::booking::approve_booking),
        )
        .route(
            "/api/bookings/:id/reject",
            post(handlers::booking::reject_booking),
        )
        .route(
            "/api/students/:id/duties",
            get(handlers::booking::list_student_duties),
        )
}
