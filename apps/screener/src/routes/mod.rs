pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers::{self, MAX_BULK_FILES};
use crate::state::AppState;

/// Room for the non-file form fields on top of the file payload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let single_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let bulk_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(MAX_BULK_FILES)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes/parse",
            post(handlers::handle_parse).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/api/v1/resumes/analyze",
            post(handlers::handle_analyze).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/api/v1/resumes/analyze/bulk",
            post(handlers::handle_analyze_bulk).layer(DefaultBodyLimit::max(bulk_limit)),
        )
        .route("/api/v1/score", post(handlers::handle_score))
        .with_state(state)
}
