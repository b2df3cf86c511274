use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::job_handlers::{health, status, submit};
use crate::state::AppState;

pub fn job_routes(state: AppState) -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/status/{id}", get(status))
        .route("/health", get(health))
        .with_state(state)
}
