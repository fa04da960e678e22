//! Spreadsheet view: every row of a dataset beside one annotator's labels,
//! and bulk saves of the caller's labels.
//!
//! Bulk saves bypass the lease flow, so each new label is checked against
//! the per-row quota under a row lock, the same way submission is.

use std::collections::HashMap;

use labeldesk_core::error::CoreError;
use labeldesk_core::labeling::{Judgment, LabelFlag, LabelingPolicy};
use labeldesk_core::types::DbId;
use labeldesk_db::models::label::Label;
use labeldesk_db::models::log_row::LogRow;
use labeldesk_db::repositories::{DatasetRepo, LabelRepo, LogRowRepo};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::labeling::ensure_quota;
use crate::error::{AppError, AppResult};

/// One row of the sheet with the viewer's label, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SheetRow {
    #[serde(flatten)]
    pub row: LogRow,
    pub label: Option<Label>,
}

/// A single edited line submitted from the sheet.
///
/// Blank confidences default to 0 and a blank flag to green.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetEdit {
    pub row_id: DbId,
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub substep: String,
    #[serde(default)]
    pub intent: String,
    pub intent_confidence: Option<i32>,
    pub patient_confidence: Option<i32>,
    pub flag: Option<LabelFlag>,
    pub reason: Option<String>,
}

impl SheetEdit {
    /// `None` for a line with neither step nor intent filled in.
    fn into_judgment(self) -> Option<Judgment> {
        if self.step.trim().is_empty() && self.intent.trim().is_empty() {
            return None;
        }
        Some(Judgment {
            step: self.step,
            substep: self.substep,
            intent: self.intent,
            intent_confidence: self.intent_confidence.unwrap_or(0),
            patient_confidence: self.patient_confidence.unwrap_or(0),
            flag: self.flag.unwrap_or(LabelFlag::Green),
            reason: self.reason,
        })
    }
}

/// Result of a bulk save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub saved: usize,
    /// Lines with neither step nor intent.
    pub skipped_blank: usize,
    /// Rows already at quota that the caller had not labeled.
    pub skipped_full: Vec<DbId>,
}

/// Every row of a dataset in ordinal order with `viewer_id`'s labels.
pub async fn sheet_rows(
    pool: &PgPool,
    dataset_id: DbId,
    viewer_id: DbId,
) -> AppResult<Vec<SheetRow>> {
    DatasetRepo::find_by_id(pool, dataset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Dataset",
            id: dataset_id,
        })?;

    let rows = LogRowRepo::list_by_dataset(pool, dataset_id).await?;
    let mut labels: HashMap<DbId, Label> =
        LabelRepo::list_for_user_in_dataset(pool, dataset_id, viewer_id)
            .await?
            .into_iter()
            .map(|l| (l.log_row_id, l))
            .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let label = labels.remove(&row.id);
            SheetRow { row, label }
        })
        .collect())
}

/// Upsert the caller's labels from a sheet in one transaction.
///
/// Rows are locked in id order. A line that fails validation or points at a
/// row outside the dataset aborts the whole save.
pub async fn save_sheet(
    pool: &PgPool,
    policy: &LabelingPolicy,
    user_id: DbId,
    dataset_id: DbId,
    mut edits: Vec<SheetEdit>,
) -> AppResult<SaveOutcome> {
    DatasetRepo::find_by_id(pool, dataset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Dataset",
            id: dataset_id,
        })?;

    edits.sort_by_key(|e| e.row_id);
    let mut outcome = SaveOutcome::default();
    let mut tx = pool.begin().await?;

    for edit in edits {
        let row_id = edit.row_id;
        let Some(judgment) = edit.into_judgment() else {
            outcome.skipped_blank += 1;
            continue;
        };
        let judgment = judgment.normalized().map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("Row {row_id}: {msg}")),
            other => other,
        })?;

        match LogRowRepo::lock_for_update(&mut *tx, row_id).await? {
            Some(owner) if owner == dataset_id => {}
            _ => {
                return Err(CoreError::Validation(format!(
                    "Row {row_id} does not belong to dataset {dataset_id}"
                ))
                .into())
            }
        }

        match ensure_quota(&mut *tx, policy, row_id, user_id).await {
            Ok(()) => {}
            Err(AppError::Core(CoreError::Conflict(_))) => {
                outcome.skipped_full.push(row_id);
                continue;
            }
            Err(e) => return Err(e),
        }

        LabelRepo::upsert(&mut *tx, row_id, user_id, &judgment).await?;
        outcome.saved += 1;
    }

    tx.commit().await?;

    tracing::info!(
        user_id,
        dataset_id,
        saved = outcome.saved,
        skipped_blank = outcome.skipped_blank,
        skipped_full = outcome.skipped_full.len(),
        "Spreadsheet labels saved"
    );
    Ok(outcome)
}
