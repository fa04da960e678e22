//! Handlers for the `/spreadsheet` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use labeldesk_core::error::CoreError;
use labeldesk_core::progress::AnnotatorProgress;
use labeldesk_core::types::DbId;
use serde::Deserialize;

use crate::engine::progress;
use crate::engine::spreadsheet::{self, SaveOutcome, SheetEdit, SheetRow};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SheetParams {
    /// Admins may review another annotator's sheet.
    pub target_user_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct SaveSheetRequest {
    pub rows: Vec<SheetEdit>,
}

/// GET /api/v1/spreadsheet/{dataset_id}/rows
pub async fn rows(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Query(params): Query<SheetParams>,
) -> AppResult<Json<DataResponse<Vec<SheetRow>>>> {
    let viewer_id = match params.target_user_id {
        Some(target) if target != auth.user_id => {
            if !auth.role.is_privileged() {
                return Err(CoreError::Forbidden(
                    "Only admins can view other users' work".into(),
                )
                .into());
            }
            target
        }
        _ => auth.user_id,
    };

    let sheet = spreadsheet::sheet_rows(&state.pool, dataset_id, viewer_id).await?;
    Ok(Json(DataResponse { data: sheet }))
}

/// POST /api/v1/spreadsheet/{dataset_id}/save
///
/// Bulk upsert of the caller's labels. Rows already at quota are skipped
/// and listed in the response.
pub async fn save(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    Json(input): Json<SaveSheetRequest>,
) -> AppResult<Json<DataResponse<SaveOutcome>>> {
    let outcome = spreadsheet::save_sheet(
        &state.pool,
        &state.config.policy,
        auth.user_id,
        dataset_id,
        input.rows,
    )
    .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/spreadsheet/{dataset_id}/progress
pub async fn annotator_progress(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AnnotatorProgress>>>> {
    let progress = progress::annotator_progress(&state.pool, dataset_id).await?;
    Ok(Json(DataResponse { data: progress }))
}
