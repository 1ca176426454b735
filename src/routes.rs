use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Create the share routes.
///
/// A known path hit with an unlisted method gets the same plain 404 as an
/// unknown path.
pub fn share_routes() -> Router<AppState> {
    Router::new()
        // Landing page
        .route("/", get(handlers::index).fallback(handlers::not_found))
        // File operations
        .route(
            "/files/*name",
            get(handlers::download).fallback(handlers::not_found),
        )
        .route(
            "/upload",
            post(handlers::upload).fallback(handlers::not_found),
        )
        .route(
            "/delete/*name",
            post(handlers::delete).fallback(handlers::not_found),
        )
        // Clipboard
        .route(
            "/clipboard",
            get(handlers::get_clipboard)
                .post(handlers::set_clipboard)
                .fallback(handlers::not_found),
        )
        // JSON listing
        .route(
            "/api/files",
            get(handlers::list_files).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
}
