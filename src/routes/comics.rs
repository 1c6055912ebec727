use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Comic Router Module
///
/// Mounts `/api/comic`. The session is optional on GET (it only widens an admin's
/// default view) and mandatory on POST, where the handler answers 401 itself.
pub fn comic_routes() -> Router<AppState> {
    Router::new()
        // GET  /api/comic?public=true|userId=...
        // POST /api/comic
        .route(
            "/api/comic",
            get(handlers::list_comics).post(handlers::create_comic),
        )
}
