//! CSV rendering for labeled datasets.

use crate::error::CoreError;
use crate::ingest::{TranscriptFields, EXPECTED_COLUMNS};
use crate::labeling::Judgment;
use crate::types::Timestamp;

/// Label columns appended after the transcript columns.
pub const LABEL_COLUMNS: [&str; 7] = [
    "Step",
    "Substep",
    "Intent",
    "Intent_Confidence",
    "Patient_Confidence",
    "Flag",
    "Reason_For_Flag",
];

/// Attribution columns used by the full label export.
pub const ATTRIBUTION_COLUMNS: [&str; 2] = ["Labeled_By", "Labeled_At"];

/// A label together with who made it and when.
#[derive(Debug, Clone, Copy)]
pub struct AttributedLabel<'a> {
    pub judgment: &'a Judgment,
    pub labeled_by: &'a str,
    pub labeled_at: Timestamp,
}

fn judgment_cells(judgment: Option<&Judgment>) -> [String; 7] {
    match judgment {
        Some(j) => [
            j.step.clone(),
            j.substep.clone(),
            j.intent.clone(),
            j.intent_confidence.to_string(),
            j.patient_confidence.to_string(),
            j.flag.to_string(),
            j.reason.clone().unwrap_or_default(),
        ],
        None => Default::default(),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, CoreError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(format!("CSV is not UTF-8: {e}")))
}

fn csv_error(e: csv::Error) -> CoreError {
    CoreError::Internal(format!("CSV write failed: {e}"))
}

/// One line per row, with one annotator's label fields (blank if the row
/// is unlabeled by them).
pub fn render_annotator_sheet<'a, I>(lines: I) -> Result<String, CoreError>
where
    I: IntoIterator<Item = (&'a TranscriptFields, Option<&'a Judgment>)>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPECTED_COLUMNS.iter().chain(LABEL_COLUMNS.iter()))
        .map_err(csv_error)?;

    for (row, judgment) in lines {
        let cells = judgment_cells(judgment);
        writer
            .write_record(
                row.values()
                    .into_iter()
                    .chain(cells.iter().map(String::as_str)),
            )
            .map_err(csv_error)?;
    }
    finish(writer)
}

/// One line per (row, label) pair with attribution columns. Unlabeled rows
/// are omitted.
pub fn render_label_export<'a, I>(lines: I) -> Result<String, CoreError>
where
    I: IntoIterator<Item = (&'a TranscriptFields, AttributedLabel<'a>)>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(
            EXPECTED_COLUMNS
                .iter()
                .chain(LABEL_COLUMNS.iter())
                .chain(ATTRIBUTION_COLUMNS.iter()),
        )
        .map_err(csv_error)?;

    for (row, label) in lines {
        let cells = judgment_cells(Some(label.judgment));
        let labeled_at = label.labeled_at.to_rfc3339();
        writer
            .write_record(
                row.values()
                    .into_iter()
                    .chain(cells.iter().map(String::as_str))
                    .chain([label.labeled_by, labeled_at.as_str()]),
            )
            .map_err(csv_error)?;
    }
    finish(writer)
}
