pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::render::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Cover letter
        .route("/render", post(handlers::handle_render_cover_letter))
        // Resume API
        .route(
            "/api/v1/resumes/render",
            post(handlers::handle_render_resume),
        )
        .route("/api/v1/resumes/parse", post(handlers::handle_parse_resume))
        .with_state(state)
}
