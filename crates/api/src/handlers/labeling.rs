//! Handlers for the `/labeling` resource: the lease-based labeling flow.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use labeldesk_core::labeling::Judgment;
use labeldesk_core::types::DbId;
use labeldesk_db::models::label::Label;
use serde::{Deserialize, Serialize};

use crate::engine::labeling::{self, LeasedRow};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /labeling/next`. An empty body is accepted.
#[derive(Debug, Default, Deserialize)]
pub struct NextRowRequest {
    #[serde(default)]
    pub dataset_id: Option<DbId>,
}

/// Request body for `POST /labeling/submit`.
#[derive(Debug, Deserialize)]
pub struct SubmitLabelRequest {
    pub row_id: DbId,
    #[serde(flatten)]
    pub judgment: Judgment,
}

/// Request body for `POST /labeling/release`.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub row_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

/// POST /api/v1/labeling/next
///
/// Lease the caller's next row, or return the row they already hold.
/// Responds 404 `NO_WORK_AVAILABLE` when nothing is left for them.
pub async fn next(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<DataResponse<LeasedRow>>> {
    let input: NextRowRequest = if body.iter().all(u8::is_ascii_whitespace) {
        NextRowRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
    };
    let leased =
        labeling::next_row(&state.pool, &state.config.policy, auth.user_id, input.dataset_id)
            .await?;
    Ok(Json(DataResponse { data: leased }))
}

/// POST /api/v1/labeling/submit
///
/// Store a label for the row the caller holds. 403 without a live lease.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SubmitLabelRequest>,
) -> AppResult<Json<DataResponse<Label>>> {
    let label = labeling::submit_label(
        &state.pool,
        &state.config.policy,
        auth.user_id,
        input.row_id,
        input.judgment,
    )
    .await?;
    Ok(Json(DataResponse { data: label }))
}

/// POST /api/v1/labeling/release
///
/// Give up the caller's lease on a row. Always acknowledges.
pub async fn release(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ReleaseRequest>,
) -> AppResult<Json<DataResponse<ReleaseResponse>>> {
    let released = labeling::release(&state.pool, auth.user_id, input.row_id).await?;
    Ok(Json(DataResponse {
        data: ReleaseResponse { released },
    }))
}

/// GET /api/v1/labeling/current
pub async fn current(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<LeasedRow>>>> {
    let held = labeling::current_lease(&state.pool, &state.config.policy, auth.user_id).await?;
    Ok(Json(DataResponse { data: held }))
}
