//! Route table.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/index_codebase", post(handlers::index_codebase))
        .route("/index_status/{project_name}", get(handlers::index_status))
        .route("/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .with_state(state)
}
