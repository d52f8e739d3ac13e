use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/profiles", post(handlers::profile::create_profile))
        .route("/api/profiles/:id", get(handlers::profile::get_profile))
        .route("/api/profiles/:id", put(handlers::profile::update_profile))
        .route(
            "/api/profiles/:id",
            delete(handlers::profile::deactivate_profile),
        )
}
