use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{export, spreadsheet};
use crate::state::AppState;

/// Spreadsheet routes mounted at `/spreadsheet`.
///
/// ```text
/// GET  /{dataset_id}/rows       -> rows
/// POST /{dataset_id}/save       -> save
/// GET  /{dataset_id}/progress   -> annotator_progress (admin)
/// GET  /{dataset_id}/export     -> export_sheet
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{dataset_id}/rows", get(spreadsheet::rows))
        .route("/{dataset_id}/save", post(spreadsheet::save))
        .route("/{dataset_id}/progress", get(spreadsheet::annotator_progress))
        .route("/{dataset_id}/export", get(export::export_sheet))
}
