//! Repository for the `datasets` table and bulk row ingestion.

use labeldesk_core::ingest::TranscriptFields;
use labeldesk_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::dataset::Dataset;

/// Column list for `datasets` queries.
const COLUMNS: &str = "id, name, uploaded_by, uploaded_at";

/// Rows per multi-row INSERT. Each row binds 23 parameters, which keeps a
/// batch well under PostgreSQL's 65535 bind limit.
const INSERT_BATCH_SIZE: usize = 1000;

/// Provides CRUD operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Create a dataset and all of its rows in a single transaction.
    ///
    /// Rows receive ordinals `0..rows.len()` in the given order. Either the
    /// dataset and every row are committed, or nothing is.
    pub async fn create_with_rows(
        pool: &PgPool,
        name: &str,
        uploaded_by: DbId,
        rows: &[TranscriptFields],
    ) -> Result<Dataset, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO datasets (name, uploaded_by) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let dataset = sqlx::query_as::<_, Dataset>(&query)
            .bind(name)
            .bind(uploaded_by)
            .fetch_one(&mut *tx)
            .await?;

        for (batch_no, batch) in rows.chunks(INSERT_BATCH_SIZE).enumerate() {
            let offset = batch_no * INSERT_BATCH_SIZE;
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO log_rows (dataset_id, row_index, engagement_id, timestamp, \
                 r_sph, r_cyl, r_axis, r_add, l_sph, l_cyl, l_axis, l_add, pd, chart_number, \
                 occluder_state, chart_display, speaker, utterance, translation_en, \
                 speaker_intent, detected_language, hesitation_markers, requires_verification) ",
            );
            builder.push_values(batch.iter().enumerate(), |mut b, (i, row)| {
                b.push_bind(dataset.id).push_bind((offset + i) as i32);
                for value in row.values() {
                    b.push_bind(value);
                }
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            dataset_id = dataset.id,
            row_count = rows.len(),
            "Dataset ingested"
        );
        Ok(dataset)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All datasets, oldest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets ORDER BY id");
        sqlx::query_as::<_, Dataset>(&query).fetch_all(pool).await
    }

    /// Delete a dataset. Rows, labels, and assignments cascade.
    ///
    /// Returns `true` if a dataset was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
