//! Lease-based row assignment and label submission.
//!
//! `next_row` runs reclaim, then select, then grant. The grant is an
//! `INSERT ... ON CONFLICT DO NOTHING` against the partial unique indexes on
//! `row_assignments`, so two concurrent callers can never both lease the same
//! row; the eligibility query is only a snapshot.

use labeldesk_core::error::CoreError;
use labeldesk_core::labeling::{Judgment, LabelingPolicy};
use labeldesk_core::types::DbId;
use labeldesk_db::models::assignment::Assignment;
use labeldesk_db::models::label::Label;
use labeldesk_db::models::log_row::LogRow;
use labeldesk_db::repositories::{AssignmentRepo, LabelRepo, LogRowRepo};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::AppResult;

/// Extra selection rounds after a lost grant race.
const GRANT_RETRIES: u32 = 1;

/// A row handed to an annotator together with the lease that covers it.
#[derive(Debug, Clone, Serialize)]
pub struct LeasedRow {
    pub row: LogRow,
    pub assignment: Assignment,
    /// True when the caller already held this lease before the request.
    pub resumed: bool,
}

/// Hand the annotator their next row, leasing it.
///
/// An annotator holding a live lease gets the same row back. Otherwise the
/// lowest-id eligible row (optionally within `dataset_id`) is leased. Fails
/// with [`CoreError::NoWorkAvailable`] when nothing is eligible, or when the
/// grant loses a race on every attempt.
pub async fn next_row(
    pool: &PgPool,
    policy: &LabelingPolicy,
    user_id: DbId,
    dataset_id: Option<DbId>,
) -> AppResult<LeasedRow> {
    for attempt in 0..=GRANT_RETRIES {
        let reclaimed = AssignmentRepo::reclaim_expired(pool, policy.lease_duration_mins).await?;
        if reclaimed > 0 {
            tracing::info!(reclaimed, "Expired leases reclaimed");
        }

        if let Some(held) = current_lease(pool, policy, user_id).await? {
            return Ok(held);
        }

        let Some(row) = LogRowRepo::find_next_eligible(pool, user_id, dataset_id, policy).await?
        else {
            return Err(CoreError::NoWorkAvailable("No rows available for labeling".into()).into());
        };

        if let Some(assignment) = AssignmentRepo::grant(pool, row.id, user_id).await? {
            tracing::info!(
                user_id,
                row_id = row.id,
                dataset_id = row.dataset_id,
                assignment_id = assignment.id,
                "Lease granted"
            );
            return Ok(LeasedRow {
                row,
                assignment,
                resumed: false,
            });
        }

        tracing::warn!(user_id, row_id = row.id, attempt, "Lease grant conflict");
    }

    Err(CoreError::NoWorkAvailable(
        "Another annotator claimed the row first, try again".into(),
    )
    .into())
}

/// The caller's live lease and its row, if any.
pub async fn current_lease(
    pool: &PgPool,
    policy: &LabelingPolicy,
    user_id: DbId,
) -> AppResult<Option<LeasedRow>> {
    let Some(assignment) =
        AssignmentRepo::find_active_for(pool, user_id, policy.lease_duration_mins).await?
    else {
        return Ok(None);
    };
    let row = LogRowRepo::find_by_id(pool, assignment.log_row_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "LogRow",
            id: assignment.log_row_id,
        })?;
    Ok(Some(LeasedRow {
        row,
        assignment,
        resumed: true,
    }))
}

/// Store the annotator's judgment for a leased row and close the lease.
///
/// The caller must hold a live lease on exactly this row; otherwise the
/// submission is forbidden. A resubmission overwrites the caller's previous
/// label. If the row filled up through another write path in the meantime,
/// the lease is released and the submission fails with a conflict.
pub async fn submit_label(
    pool: &PgPool,
    policy: &LabelingPolicy,
    user_id: DbId,
    row_id: DbId,
    judgment: Judgment,
) -> AppResult<Label> {
    let judgment = judgment.normalized()?;
    let mut tx = pool.begin().await?;

    let lease =
        AssignmentRepo::lock_live_lease(&mut *tx, row_id, user_id, policy.lease_duration_mins)
            .await?
            .ok_or_else(|| {
                CoreError::Forbidden("Row not assigned to you or session expired".into())
            })?;

    LogRowRepo::lock_for_update(&mut *tx, row_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "LogRow",
            id: row_id,
        })?;

    if let Err(e) = ensure_quota(&mut *tx, policy, row_id, user_id).await {
        tx.rollback().await?;
        AssignmentRepo::release(pool, row_id, user_id).await?;
        tracing::warn!(user_id, row_id, "Submission refused, row already at quota");
        return Err(e);
    }

    let label = LabelRepo::upsert(&mut *tx, row_id, user_id, &judgment).await?;
    AssignmentRepo::complete(&mut *tx, lease.id).await?;
    tx.commit().await?;

    tracing::info!(user_id, row_id, label_id = label.id, "Label submitted");
    Ok(label)
}

/// End the caller's lease on a row. Releasing a lease that does not exist is
/// a no-op. Returns whether a lease was ended.
pub async fn release(pool: &PgPool, user_id: DbId, row_id: DbId) -> AppResult<bool> {
    let released = AssignmentRepo::release(pool, row_id, user_id).await?;
    if released {
        tracing::info!(user_id, row_id, "Lease released");
    } else {
        tracing::debug!(user_id, row_id, "Release requested without an active lease");
    }
    Ok(released)
}

/// Refuse a new label on a row that already carries labels from
/// `labels_per_row` annotators. Updates to the caller's own label pass.
///
/// The row must already be locked in the caller's transaction.
pub(crate) async fn ensure_quota(
    conn: &mut PgConnection,
    policy: &LabelingPolicy,
    row_id: DbId,
    user_id: DbId,
) -> AppResult<()> {
    if LabelRepo::find_for(&mut *conn, row_id, user_id).await?.is_some() {
        return Ok(());
    }
    let annotators = LabelRepo::count_annotators(&mut *conn, row_id).await?;
    if policy.quota_reached(annotators) {
        return Err(CoreError::Conflict(format!(
            "Row {row_id} already has {annotators} labels"
        ))
        .into());
    }
    Ok(())
}
