//! Route definitions for datasets, including ingestion and admin export.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{datasets, export};
use crate::state::AppState;

/// Largest accepted CSV upload.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Dataset routes mounted at `/datasets`.
///
/// ```text
/// GET    /                 -> list
/// POST   /?name=...        -> upload (admin, CSV body)
/// DELETE /{id}             -> delete (admin)
/// GET    /{id}/progress    -> get_progress
/// GET    /{id}/export      -> export_dataset (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(datasets::list)
                .post(datasets::upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/{id}", delete(datasets::delete))
        .route("/{id}/progress", get(datasets::get_progress))
        .route("/{id}/export", get(export::export_dataset))
}
