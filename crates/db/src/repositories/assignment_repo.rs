//! Lease Manager storage: grants, releases, and reclaims row assignments.
//!
//! Exclusivity is enforced by the partial unique indexes on
//! `row_assignments` (one active lease per row and per annotator). Every
//! method that answers "is this lease live?" also checks the lease age, so
//! an expired lease is treated as absent even before it is reclaimed.

use labeldesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::assignment::Assignment;

/// Column list for `row_assignments` queries.
const COLUMNS: &str = "id, log_row_id, assigned_to, status, assigned_at, ended_at";

/// Provides lease operations on row assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Mark every active lease older than `lease_mins` as expired.
    ///
    /// Returns the number of leases reclaimed.
    pub async fn reclaim_expired(pool: &PgPool, lease_mins: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE row_assignments SET status = 'expired', ended_at = NOW() \
             WHERE status = 'active' \
               AND assigned_at < NOW() - make_interval(mins => $1::INT)",
        )
        .bind(lease_mins)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Attempt to create an active lease on `row_id` for `user_id`.
    ///
    /// Uses `INSERT ... ON CONFLICT DO NOTHING` against the partial unique
    /// indexes. Returns `None` when the row is already leased or the
    /// annotator already holds a lease; the caller treats that as a
    /// conflict.
    pub async fn grant(
        pool: &PgPool,
        row_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!(
            "INSERT INTO row_assignments (log_row_id, assigned_to) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(row_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// End the caller's active lease on a row. Only the holder can release.
    ///
    /// Returns `true` if a lease was released, `false` if there was none.
    pub async fn release(pool: &PgPool, row_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE row_assignments SET status = 'released', ended_at = NOW() \
             WHERE log_row_id = $1 AND assigned_to = $2 AND status = 'active'",
        )
        .bind(row_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The annotator's live lease, if any.
    pub async fn find_active_for(
        pool: &PgPool,
        user_id: DbId,
        lease_mins: i64,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM row_assignments \
             WHERE assigned_to = $1 AND status = 'active' \
               AND assigned_at >= NOW() - make_interval(mins => $2::INT)"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(user_id)
            .bind(lease_mins)
            .fetch_optional(pool)
            .await
    }

    /// The live lease on a row, whoever holds it.
    pub async fn find_active_on_row(
        pool: &PgPool,
        row_id: DbId,
        lease_mins: i64,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM row_assignments \
             WHERE log_row_id = $1 AND status = 'active' \
               AND assigned_at >= NOW() - make_interval(mins => $2::INT)"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(row_id)
            .bind(lease_mins)
            .fetch_optional(pool)
            .await
    }

    /// Lock the caller's live lease on exactly this row for the rest of the
    /// transaction. `None` means the caller is not authorized to label it.
    pub async fn lock_live_lease<'e, E>(
        executor: E,
        row_id: DbId,
        user_id: DbId,
        lease_mins: i64,
    ) -> Result<Option<Assignment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM row_assignments \
             WHERE log_row_id = $1 AND assigned_to = $2 AND status = 'active' \
               AND assigned_at >= NOW() - make_interval(mins => $3::INT) \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(row_id)
            .bind(user_id)
            .bind(lease_mins)
            .fetch_optional(executor)
            .await
    }

    /// Close a lease because its holder submitted a label.
    pub async fn complete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE row_assignments SET status = 'completed', ended_at = NOW() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
