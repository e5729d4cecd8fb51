use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and the embedding backend in use.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let provider = state.engine.provider();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "embedding": {
            "backend": provider.name(),
            "version": provider.version(),
            "dimension": provider.dimension()
        }
    }))
}
