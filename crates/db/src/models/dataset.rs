//! Dataset entity model.

use labeldesk_core::progress::DatasetProgress;
use labeldesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub name: String,
    pub uploaded_by: Option<DbId>,
    pub uploaded_at: Timestamp,
}

/// A dataset with its derived progress, as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub progress: DatasetProgress,
}
