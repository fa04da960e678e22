//! Row assignment (lease) model.

use labeldesk_core::labeling::AssignmentStatus;
use labeldesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `row_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub log_row_id: DbId,
    pub assigned_to: DbId,
    #[sqlx(try_from = "String")]
    pub status: AssignmentStatus,
    pub assigned_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}
