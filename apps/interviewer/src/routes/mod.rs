pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route(
            "/api/v1/session/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/session/analyze", post(handlers::handle_analyze))
        .route("/api/v1/session/generate", post(handlers::handle_generate))
        .route("/api/v1/session/next", post(handlers::handle_next))
        .route("/api/v1/session/prev", post(handlers::handle_prev))
        .route("/api/v1/session/reset", post(handlers::handle_reset))
        .route(
            "/api/v1/session/questions",
            get(handlers::handle_list_questions),
        )
        .with_state(state)
}
