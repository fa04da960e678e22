//! Transcript row model.
//!
//! Rows are written once at ingestion and never updated.

use labeldesk_core::ingest::TranscriptFields;
use labeldesk_core::types::DbId;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// Column list shared by every `log_rows` query.
pub const LOG_ROW_COLUMNS: &str = "id, dataset_id, row_index, engagement_id, timestamp, \
    r_sph, r_cyl, r_axis, r_add, l_sph, l_cyl, l_axis, l_add, pd, chart_number, \
    occluder_state, chart_display, speaker, utterance, translation_en, speaker_intent, \
    detected_language, hesitation_markers, requires_verification";

/// A row from the `log_rows` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRow {
    pub id: DbId,
    pub dataset_id: DbId,
    pub row_index: i32,
    #[serde(flatten)]
    pub fields: TranscriptFields,
}

impl<'r> FromRow<'r, PgRow> for LogRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            dataset_id: row.try_get("dataset_id")?,
            row_index: row.try_get("row_index")?,
            fields: TranscriptFields {
                engagement_id: row.try_get("engagement_id")?,
                timestamp: row.try_get("timestamp")?,
                r_sph: row.try_get("r_sph")?,
                r_cyl: row.try_get("r_cyl")?,
                r_axis: row.try_get("r_axis")?,
                r_add: row.try_get("r_add")?,
                l_sph: row.try_get("l_sph")?,
                l_cyl: row.try_get("l_cyl")?,
                l_axis: row.try_get("l_axis")?,
                l_add: row.try_get("l_add")?,
                pd: row.try_get("pd")?,
                chart_number: row.try_get("chart_number")?,
                occluder_state: row.try_get("occluder_state")?,
                chart_display: row.try_get("chart_display")?,
                speaker: row.try_get("speaker")?,
                utterance: row.try_get("utterance")?,
                translation_en: row.try_get("translation_en")?,
                speaker_intent: row.try_get("speaker_intent")?,
                detected_language: row.try_get("detected_language")?,
                hesitation_markers: row.try_get("hesitation_markers")?,
                requires_verification: row.try_get("requires_verification")?,
            },
        })
    }
}
