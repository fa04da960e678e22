//! Read-only aggregate queries backing dataset and annotator progress.

use labeldesk_core::progress::DatasetCounts;
use labeldesk_core::types::DbId;
use sqlx::{FromRow, PgPool};

/// Counts for one dataset as returned by the aggregate queries.
#[derive(Debug, Clone, Copy, FromRow)]
struct CountsRow {
    dataset_id: DbId,
    total_rows: i64,
    labeled_rows: i64,
    label_count: i64,
    annotator_count: i64,
}

impl CountsRow {
    fn split(self) -> (DbId, DatasetCounts) {
        (
            self.dataset_id,
            DatasetCounts {
                total_rows: self.total_rows,
                labeled_rows: self.labeled_rows,
                label_count: self.label_count,
                annotator_count: self.annotator_count,
            },
        )
    }
}

/// Label count for one annotator within a dataset.
#[derive(Debug, Clone, FromRow)]
pub struct AnnotatorCountRow {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub labeled_count: i64,
}

/// Aggregate shared by the single-dataset and all-dataset queries.
const COUNTS_SELECT: &str = "SELECT d.id AS dataset_id, \
        (SELECT COUNT(*) FROM log_rows r WHERE r.dataset_id = d.id) AS total_rows, \
        (SELECT COUNT(DISTINCT l.log_row_id) FROM labels l \
           JOIN log_rows r ON r.id = l.log_row_id WHERE r.dataset_id = d.id) AS labeled_rows, \
        (SELECT COUNT(*) FROM labels l \
           JOIN log_rows r ON r.id = l.log_row_id WHERE r.dataset_id = d.id) AS label_count, \
        (SELECT COUNT(DISTINCT l.labeled_by) FROM labels l \
           JOIN log_rows r ON r.id = l.log_row_id WHERE r.dataset_id = d.id) AS annotator_count \
    FROM datasets d";

/// Provides progress aggregates.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Counts for one dataset, or `None` if it does not exist.
    pub async fn dataset_counts(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Option<DatasetCounts>, sqlx::Error> {
        let query = format!("{COUNTS_SELECT} WHERE d.id = $1");
        let row = sqlx::query_as::<_, CountsRow>(&query)
            .bind(dataset_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.split().1))
    }

    /// Counts for every dataset, ordered by dataset id.
    pub async fn all_dataset_counts(
        pool: &PgPool,
    ) -> Result<Vec<(DbId, DatasetCounts)>, sqlx::Error> {
        let query = format!("{COUNTS_SELECT} ORDER BY d.id");
        let rows = sqlx::query_as::<_, CountsRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(CountsRow::split).collect())
    }

    /// Ids of datasets in which the user has at least one label.
    pub async fn contributed_dataset_ids(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT DISTINCT r.dataset_id FROM labels l \
             JOIN log_rows r ON r.id = l.log_row_id \
             WHERE l.labeled_by = $1 \
             ORDER BY r.dataset_id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Label counts per annotator in a dataset, highest first.
    pub async fn annotator_counts(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<AnnotatorCountRow>, sqlx::Error> {
        sqlx::query_as::<_, AnnotatorCountRow>(
            "SELECT u.id AS user_id, u.name, u.email, COUNT(l.id) AS labeled_count \
             FROM labels l \
             JOIN log_rows r ON r.id = l.log_row_id \
             JOIN users u ON u.id = l.labeled_by \
             WHERE r.dataset_id = $1 \
             GROUP BY u.id, u.name, u.email \
             ORDER BY labeled_count DESC, u.id",
        )
        .bind(dataset_id)
        .fetch_all(pool)
        .await
    }
}
