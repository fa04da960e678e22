pub mod auth;
pub mod datasets;
pub mod health;
pub mod labeling;
pub mod spreadsheet;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /datasets                                        list, upload (admin)
/// /datasets/{id}                                   delete (admin)
/// /datasets/{id}/progress                          completion figures
/// /datasets/{id}/export                            attributed CSV (admin)
///
/// /labeling/next                                   lease next row (POST)
/// /labeling/submit                                 submit label (POST)
/// /labeling/release                                release lease (POST)
/// /labeling/current                                held lease (GET)
///
/// /spreadsheet/{dataset_id}/rows                   sheet view
/// /spreadsheet/{dataset_id}/save                   bulk save (POST)
/// /spreadsheet/{dataset_id}/progress               per-annotator progress (admin)
/// /spreadsheet/{dataset_id}/export                 caller's sheet as CSV
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/datasets", datasets::router())
        .nest("/labeling", labeling::router())
        .nest("/spreadsheet", spreadsheet::router())
}
