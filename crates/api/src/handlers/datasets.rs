//! Handlers for the `/datasets` resource: upload, listing, progress, delete.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use labeldesk_core::error::CoreError;
use labeldesk_core::ingest::parse_transcript_csv;
use labeldesk_core::progress::{shuffle_for, DatasetProgress};
use labeldesk_core::types::DbId;
use labeldesk_db::models::dataset::{Dataset, DatasetSummary};
use labeldesk_db::repositories::DatasetRepo;
use serde::{Deserialize, Serialize};

use crate::engine::progress;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `POST /datasets`.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
}

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub row_count: usize,
    pub duplicates_removed: usize,
}

/// POST /api/v1/datasets?name=...
///
/// Ingest a CSV transcript log as a new dataset. The body is the raw CSV.
/// Nothing is stored if any part of the upload is rejected.
pub async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<DataResponse<UploadResponse>>)> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Dataset name must not be empty".into()).into());
    }

    let parsed = parse_transcript_csv(&body)?;
    let dataset = DatasetRepo::create_with_rows(&state.pool, name, admin.user_id, &parsed.rows)
        .await?;

    tracing::info!(
        user_id = admin.user_id,
        dataset_id = dataset.id,
        duplicates_removed = parsed.duplicates_removed,
        "Dataset uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResponse {
                dataset,
                row_count: parsed.rows.len(),
                duplicates_removed: parsed.duplicates_removed,
            },
        }),
    ))
}

/// GET /api/v1/datasets
///
/// Datasets visible to the caller, with progress. Non-admins get them in a
/// fresh random order on every call.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DatasetSummary>>>> {
    let mut datasets =
        progress::visible_datasets(&state.pool, &state.config.policy, auth.user_id, auth.role)
            .await?;
    shuffle_for(&mut datasets, auth.role, &mut rand::rng());
    Ok(Json(DataResponse { data: datasets }))
}

/// GET /api/v1/datasets/{id}/progress
pub async fn get_progress(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DatasetProgress>>> {
    let progress = progress::dataset_progress(&state.pool, &state.config.policy, id).await?;
    Ok(Json(DataResponse { data: progress }))
}

/// DELETE /api/v1/datasets/{id}
///
/// Removes the dataset with its rows, labels, and leases.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !DatasetRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "Dataset",
            id,
        }
        .into());
    }
    tracing::info!(user_id = admin.user_id, dataset_id = id, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}
