//! Label Store: one label per (row, annotator), upserted on resubmission.

use labeldesk_core::labeling::Judgment;
use labeldesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::label::{AttributedLabelRow, Label};

/// Column list for `labels` queries.
const COLUMNS: &str = "id, log_row_id, labeled_by, step, substep, intent, intent_confidence, \
                       patient_confidence, flag, reason, created_at, updated_at";

/// Same columns qualified with the `l` alias, for joins.
const L_COLUMNS: &str = "l.id, l.log_row_id, l.labeled_by, l.step, l.substep, l.intent, \
                         l.intent_confidence, l.patient_confidence, l.flag, l.reason, \
                         l.created_at, l.updated_at";

/// Provides operations on labels.
pub struct LabelRepo;

impl LabelRepo {
    /// Insert the annotator's label for a row, or overwrite it in place if
    /// one exists (`uq_labels_row_user`). `created_at` is preserved.
    pub async fn upsert<'e, E>(
        executor: E,
        row_id: DbId,
        user_id: DbId,
        judgment: &Judgment,
    ) -> Result<Label, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO labels (log_row_id, labeled_by, step, substep, intent, \
                                 intent_confidence, patient_confidence, flag, reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT ON CONSTRAINT uq_labels_row_user DO UPDATE SET \
                 step = EXCLUDED.step, \
                 substep = EXCLUDED.substep, \
                 intent = EXCLUDED.intent, \
                 intent_confidence = EXCLUDED.intent_confidence, \
                 patient_confidence = EXCLUDED.patient_confidence, \
                 flag = EXCLUDED.flag, \
                 reason = EXCLUDED.reason, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Label>(&query)
            .bind(row_id)
            .bind(user_id)
            .bind(&judgment.step)
            .bind(&judgment.substep)
            .bind(&judgment.intent)
            .bind(judgment.intent_confidence)
            .bind(judgment.patient_confidence)
            .bind(judgment.flag.as_str())
            .bind(&judgment.reason)
            .fetch_one(executor)
            .await
    }

    /// The annotator's label on a row, if any.
    pub async fn find_for<'e, E>(
        executor: E,
        row_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Label>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query =
            format!("SELECT {COLUMNS} FROM labels WHERE log_row_id = $1 AND labeled_by = $2");
        sqlx::query_as::<_, Label>(&query)
            .bind(row_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Distinct annotators who labeled a row.
    pub async fn count_annotators<'e, E>(executor: E, row_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT labeled_by) FROM labels WHERE log_row_id = $1")
                .bind(row_id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    /// All labels on a row, oldest first.
    pub async fn list_for_row(pool: &PgPool, row_id: DbId) -> Result<Vec<Label>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM labels WHERE log_row_id = $1 ORDER BY created_at, id");
        sqlx::query_as::<_, Label>(&query)
            .bind(row_id)
            .fetch_all(pool)
            .await
    }

    /// One annotator's labels within a dataset.
    pub async fn list_for_user_in_dataset(
        pool: &PgPool,
        dataset_id: DbId,
        user_id: DbId,
    ) -> Result<Vec<Label>, sqlx::Error> {
        let query = format!(
            "SELECT {L_COLUMNS} FROM labels l \
             JOIN log_rows r ON r.id = l.log_row_id \
             WHERE r.dataset_id = $1 AND l.labeled_by = $2 \
             ORDER BY r.row_index"
        );
        sqlx::query_as::<_, Label>(&query)
            .bind(dataset_id)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every label in a dataset with its author's email, in row order.
    pub async fn list_attributed_in_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<AttributedLabelRow>, sqlx::Error> {
        let query = format!(
            "SELECT {L_COLUMNS}, u.email AS author_email FROM labels l \
             JOIN log_rows r ON r.id = l.log_row_id \
             JOIN users u ON u.id = l.labeled_by \
             WHERE r.dataset_id = $1 \
             ORDER BY r.row_index, l.created_at, l.id"
        );
        sqlx::query_as::<_, AttributedLabelRow>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }
}
