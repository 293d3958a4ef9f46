use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/view", get(handlers::get_view))
        .route("/api/config", post(handlers::save_config))
        .route("/api/connect", post(handlers::connect))
        .route("/api/retry", post(handlers::retry))
        .route("/api/visibility", post(handlers::set_visibility))
        .with_state(state)
}
