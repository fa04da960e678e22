//! Label entity model.

use labeldesk_core::labeling::{Judgment, LabelFlag};
use labeldesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `labels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Label {
    pub id: DbId,
    pub log_row_id: DbId,
    pub labeled_by: DbId,
    pub step: String,
    pub substep: String,
    pub intent: String,
    pub intent_confidence: i32,
    pub patient_confidence: i32,
    #[sqlx(try_from = "String")]
    pub flag: LabelFlag,
    pub reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Label {
    pub fn judgment(&self) -> Judgment {
        Judgment {
            step: self.step.clone(),
            substep: self.substep.clone(),
            intent: self.intent.clone(),
            intent_confidence: self.intent_confidence,
            patient_confidence: self.patient_confidence,
            flag: self.flag,
            reason: self.reason.clone(),
        }
    }
}

/// A label joined with its author's email, for exports.
#[derive(Debug, Clone, FromRow)]
pub struct AttributedLabelRow {
    #[sqlx(flatten)]
    pub label: Label,
    pub author_email: String,
}
