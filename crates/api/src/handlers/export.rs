//! CSV export handlers.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use labeldesk_core::error::CoreError;
use labeldesk_core::export::{render_annotator_sheet, render_label_export, AttributedLabel};
use labeldesk_core::labeling::Judgment;
use labeldesk_core::types::DbId;
use labeldesk_db::repositories::{DatasetRepo, LabelRepo, LogRowRepo};

use crate::engine::spreadsheet;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

fn csv_attachment(filename: String, body: String) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/v1/datasets/{id}/export
///
/// Every label in the dataset joined with its row, attributed to its author.
pub async fn export_dataset(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    DatasetRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Dataset",
            id,
        })?;

    let rows: HashMap<DbId, _> = LogRowRepo::list_by_dataset(&state.pool, id)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();
    let labels = LabelRepo::list_attributed_in_dataset(&state.pool, id).await?;
    let judgments: Vec<Judgment> = labels.iter().map(|l| l.label.judgment()).collect();

    let lines = labels.iter().zip(&judgments).filter_map(|(l, judgment)| {
        rows.get(&l.label.log_row_id).map(|row| {
            (
                &row.fields,
                AttributedLabel {
                    judgment,
                    labeled_by: &l.author_email,
                    labeled_at: l.label.created_at,
                },
            )
        })
    });
    let csv = render_label_export(lines)?;

    tracing::info!(
        user_id = admin.user_id,
        dataset_id = id,
        label_count = labels.len(),
        "Dataset exported"
    );
    Ok(csv_attachment(format!("labeled_dataset_{id}.csv"), csv))
}

/// GET /api/v1/spreadsheet/{dataset_id}/export
///
/// Every row of the dataset with the caller's own label fields.
pub async fn export_sheet(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<Response> {
    let sheet = spreadsheet::sheet_rows(&state.pool, dataset_id, auth.user_id).await?;
    let judgments: Vec<Option<Judgment>> = sheet
        .iter()
        .map(|s| s.label.as_ref().map(|l| l.judgment()))
        .collect();

    let csv = render_annotator_sheet(
        sheet
            .iter()
            .zip(&judgments)
            .map(|(s, judgment)| (&s.row.fields, judgment.as_ref())),
    )?;

    Ok(csv_attachment(
        format!("dataset_{dataset_id}_labeled.csv"),
        csv,
    ))
}
