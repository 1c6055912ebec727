use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated infrastructure endpoints.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Returns "ok" immediately so monitors can verify the process is serving.
        .route("/health", get(|| async { "ok" }))
}
