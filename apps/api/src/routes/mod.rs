pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/resumes",
            post(handlers::handle_create).get(handlers::handle_list),
        )
        .route(
            "/resumes/:id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        )
        .route(
            "/resumes/:id/status",
            put(handlers::handle_update_status).patch(handlers::handle_update_status),
        )
        .route("/resumes/:id/upload", post(handlers::handle_upload))
        .route("/resumes/:id/download", get(handlers::handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
