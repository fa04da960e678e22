//! Row Store: read access to ingested transcript rows, plus the eligibility
//! query used by next-row selection.

use labeldesk_core::labeling::LabelingPolicy;
use labeldesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::log_row::{LogRow, LOG_ROW_COLUMNS};

/// Provides read operations for transcript rows.
pub struct LogRowRepo;

impl LogRowRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LogRow>, sqlx::Error> {
        let query = format!("SELECT {LOG_ROW_COLUMNS} FROM log_rows WHERE id = $1");
        sqlx::query_as::<_, LogRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All rows of a dataset in ordinal order.
    pub async fn list_by_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<LogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_ROW_COLUMNS} FROM log_rows WHERE dataset_id = $1 ORDER BY row_index"
        );
        sqlx::query_as::<_, LogRow>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Take a row-level lock for the rest of the caller's transaction.
    ///
    /// Label writers on the same row serialize here, so the quota check
    /// that follows sees every committed label. Returns the row's dataset
    /// id, or `None` if the row does not exist.
    pub async fn lock_for_update<'e, E>(executor: E, id: DbId) -> Result<Option<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT dataset_id FROM log_rows WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(locked.map(|(dataset_id,)| dataset_id))
    }

    /// The lowest-id row the annotator may be handed next, or `None`.
    ///
    /// Excludes rows the annotator already labeled, rows under any
    /// unexpired active lease, and rows that already carry labels from
    /// `labels_per_row` distinct annotators. When `dataset_id` is given the
    /// search is limited to that dataset.
    ///
    /// This is a snapshot read; the grant that follows is what actually
    /// arbitrates between concurrent callers.
    pub async fn find_next_eligible(
        pool: &PgPool,
        annotator_id: DbId,
        dataset_id: Option<DbId>,
        policy: &LabelingPolicy,
    ) -> Result<Option<LogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {LOG_ROW_COLUMNS} FROM log_rows WHERE id = ( \
                 SELECT r.id FROM log_rows r \
                 WHERE ($2::BIGINT IS NULL OR r.dataset_id = $2) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM labels l \
                       WHERE l.log_row_id = r.id AND l.labeled_by = $1) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM row_assignments a \
                       WHERE a.log_row_id = r.id AND a.status = 'active' \
                         AND a.assigned_at >= NOW() - make_interval(mins => $4::INT)) \
                   AND (SELECT COUNT(DISTINCT l.labeled_by) FROM labels l \
                        WHERE l.log_row_id = r.id) < $3 \
                 ORDER BY r.id \
                 LIMIT 1)"
        );
        sqlx::query_as::<_, LogRow>(&query)
            .bind(annotator_id)
            .bind(dataset_id)
            .bind(policy.labels_per_row)
            .bind(policy.lease_duration_mins)
            .fetch_optional(pool)
            .await
    }
}
