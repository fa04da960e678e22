//! Transcript CSV ingestion: header normalization, required-column checks,
//! and adjacent-duplicate removal.
//!
//! The result is a list of [`TranscriptFields`] in upload order; the caller
//! assigns ordinals and persists them in a single transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Canonical column names, in export order.
pub const EXPECTED_COLUMNS: [&str; 21] = [
    "Engagement_ID",
    "timestamp",
    "R_SPH",
    "R_CYL",
    "R_AXIS",
    "R_ADD",
    "L_SPH",
    "L_CYL",
    "L_AXIS",
    "L_ADD",
    "PD",
    "Chart_Number",
    "Occluder_State",
    "Chart_Display",
    "Speaker",
    "Utterance_Text",
    "Translation_in_En",
    "Speaker_Intent",
    "Detected_Language",
    "Hesitation_Markers",
    "Requires_Verification",
];

/// An upload missing any of these is rejected.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Engagement_ID", "timestamp", "Speaker", "Utterance_Text"];

/// Alternative header spellings seen in transcript exports. Matched exactly,
/// after whitespace normalization.
pub const COLUMN_ALIASES: [(&str, &str); 7] = [
    ("Utterance", "Utterance_Text"),
    ("transcription", "Utterance_Text"),
    ("text", "Utterance_Text"),
    ("speaker_id", "Speaker"),
    ("session", "Engagement_ID"),
    ("Session_ID", "Engagement_ID"),
    ("session_id", "Engagement_ID"),
];

/// The immutable text payload of one transcript row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFields {
    pub engagement_id: String,
    pub timestamp: String,
    pub r_sph: String,
    pub r_cyl: String,
    pub r_axis: String,
    pub r_add: String,
    pub l_sph: String,
    pub l_cyl: String,
    pub l_axis: String,
    pub l_add: String,
    pub pd: String,
    pub chart_number: String,
    pub occluder_state: String,
    pub chart_display: String,
    pub speaker: String,
    pub utterance: String,
    pub translation_en: String,
    pub speaker_intent: String,
    pub detected_language: String,
    pub hesitation_markers: String,
    pub requires_verification: String,
}

impl TranscriptFields {
    /// Build from a lookup keyed by canonical column name. Absent columns
    /// become empty strings.
    pub fn from_columns<F>(mut value_of: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        Self {
            engagement_id: value_of("Engagement_ID"),
            timestamp: value_of("timestamp"),
            r_sph: value_of("R_SPH"),
            r_cyl: value_of("R_CYL"),
            r_axis: value_of("R_AXIS"),
            r_add: value_of("R_ADD"),
            l_sph: value_of("L_SPH"),
            l_cyl: value_of("L_CYL"),
            l_axis: value_of("L_AXIS"),
            l_add: value_of("L_ADD"),
            pd: value_of("PD"),
            chart_number: value_of("Chart_Number"),
            occluder_state: value_of("Occluder_State"),
            chart_display: value_of("Chart_Display"),
            speaker: value_of("Speaker"),
            utterance: value_of("Utterance_Text"),
            translation_en: value_of("Translation_in_En"),
            speaker_intent: value_of("Speaker_Intent"),
            detected_language: value_of("Detected_Language"),
            hesitation_markers: value_of("Hesitation_Markers"),
            requires_verification: value_of("Requires_Verification"),
        }
    }

    /// Values in [`EXPECTED_COLUMNS`] order.
    pub fn values(&self) -> [&str; 21] {
        [
            &self.engagement_id,
            &self.timestamp,
            &self.r_sph,
            &self.r_cyl,
            &self.r_axis,
            &self.r_add,
            &self.l_sph,
            &self.l_cyl,
            &self.l_axis,
            &self.l_add,
            &self.pd,
            &self.chart_number,
            &self.occluder_state,
            &self.chart_display,
            &self.speaker,
            &self.utterance,
            &self.translation_en,
            &self.speaker_intent,
            &self.detected_language,
            &self.hesitation_markers,
            &self.requires_verification,
        ]
    }

    /// Clinical readings plus speaker. Consecutive rows equal on this key
    /// are duplicates of each other.
    fn duplicate_key(&self) -> [&str; 13] {
        [
            &self.r_sph,
            &self.r_cyl,
            &self.r_axis,
            &self.r_add,
            &self.l_sph,
            &self.l_cyl,
            &self.l_axis,
            &self.l_add,
            &self.pd,
            &self.chart_number,
            &self.occluder_state,
            &self.chart_display,
            &self.speaker,
        ]
    }
}

/// Outcome of parsing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpload {
    pub rows: Vec<TranscriptFields>,
    /// Rows dropped because they repeated their predecessor.
    pub duplicates_removed: usize,
}

/// Map raw headers to canonical column names.
///
/// Headers are trimmed and inner spaces become underscores. Aliases are
/// applied first, then any remaining expected column is matched
/// case-insensitively. Unknown headers are kept as-is and ignored later.
pub fn normalize_headers<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut names: Vec<String> = headers
        .into_iter()
        .map(|h| {
            let cleaned = h.trim().replace(' ', "_");
            COLUMN_ALIASES
                .iter()
                .find(|(alias, _)| *alias == cleaned)
                .map(|(_, target)| (*target).to_string())
                .unwrap_or(cleaned)
        })
        .collect();

    for target in EXPECTED_COLUMNS {
        if names.iter().any(|n| n == target) {
            continue;
        }
        if let Some(name) = names.iter_mut().find(|n| n.eq_ignore_ascii_case(target)) {
            *name = target.to_string();
        }
    }
    names
}

/// Parse an uploaded transcript CSV.
///
/// Fails with [`CoreError::Validation`] when the CSV is malformed, a
/// required column is missing, or no rows remain.
pub fn parse_transcript_csv(bytes: &[u8]) -> Result<ParsedUpload, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("CSV parse error: {e}")))?
        .clone();
    let headers = normalize_headers(raw_headers.iter());

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(CoreError::Validation(format!(
                "Missing required column: {required}"
            )));
        }
    }

    // First occurrence wins when a header repeats.
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        index.entry(h.as_str()).or_insert(i);
    }

    let mut rows: Vec<TranscriptFields> = Vec::new();
    let mut duplicates_removed = 0;

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            CoreError::Validation(format!("CSV parse error on data row {}: {e}", line + 1))
        })?;
        let fields = TranscriptFields::from_columns(|column| {
            index
                .get(column)
                .and_then(|&i| record.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        });

        if rows
            .last()
            .is_some_and(|prev| prev.duplicate_key() == fields.duplicate_key())
        {
            duplicates_removed += 1;
            continue;
        }
        rows.push(fields);
    }

    if rows.is_empty() {
        return Err(CoreError::Validation("CSV contains no data rows".into()));
    }

    Ok(ParsedUpload {
        rows,
        duplicates_removed,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_headers_are_trimmed_and_underscored() {
        let names = normalize_headers([" Chart Number ", "Speaker"]);
        assert_eq!(names, vec!["Chart_Number", "Speaker"]);
    }

    #[test]
    fn test_aliases_map_to_canonical_names() {
        let names = normalize_headers(["session_id", "speaker_id", "transcription", "time"]);
        assert_eq!(names, vec!["Engagement_ID", "Speaker", "Utterance_Text", "time"]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let names = normalize_headers(["ENGAGEMENT_ID", "Timestamp", "r_sph"]);
        assert_eq!(names, vec!["Engagement_ID", "timestamp", "R_SPH"]);
    }

    #[test]
    fn test_missing_required_column_is_reported() {
        let csv = "Engagement_ID,timestamp,Speaker\nE1,00:01,Patient\n";
        assert_matches!(
            parse_transcript_csv(csv.as_bytes()),
            Err(CoreError::Validation(msg)) if msg == "Missing required column: Utterance_Text"
        );
    }

    #[test]
    fn test_parse_maps_fields() {
        let csv = "Session ID,timestamp,Speaker,Utterance,R_SPH,PD\n\
                   E1,00:01,Optometrist,Read the top line,-1.25,62\n";
        let parsed = parse_transcript_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.engagement_id, "E1");
        assert_eq!(row.speaker, "Optometrist");
        assert_eq!(row.utterance, "Read the top line");
        assert_eq!(row.r_sph, "-1.25");
        assert_eq!(row.pd, "62");
        assert_eq!(row.l_sph, "");
    }

    #[test]
    fn test_adjacent_duplicates_are_dropped() {
        let csv = "Engagement_ID,timestamp,Speaker,Utterance_Text,R_SPH\n\
                   E1,00:01,Patient,hello,-1.00\n\
                   E1,00:02,Patient,hello again,-1.00\n\
                   E1,00:03,Optometrist,better?,-1.00\n\
                   E1,00:04,Patient,yes,-1.00\n";
        let parsed = parse_transcript_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.duplicates_removed, 1);
        let utterances: Vec<_> = parsed.rows.iter().map(|r| r.utterance.as_str()).collect();
        assert_eq!(utterances, vec!["hello", "better?", "yes"]);
    }

    #[test]
    fn test_non_adjacent_repeats_are_kept() {
        let csv = "Engagement_ID,timestamp,Speaker,Utterance_Text\n\
                   E1,1,Patient,a\n\
                   E1,2,Optometrist,b\n\
                   E1,3,Patient,c\n";
        let parsed = parse_transcript_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.duplicates_removed, 0);
    }

    #[test]
    fn test_header_only_upload_is_rejected() {
        let csv = "Engagement_ID,timestamp,Speaker,Utterance_Text\n";
        assert_matches!(
            parse_transcript_csv(csv.as_bytes()),
            Err(CoreError::Validation(msg)) if msg.contains("no data rows")
        );
    }

    #[test]
    fn test_short_records_fill_with_empty() {
        let csv = "Engagement_ID,timestamp,Speaker,Utterance_Text,PD\nE1,1,Patient\n";
        let parsed = parse_transcript_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows[0].utterance, "");
        assert_eq!(parsed.rows[0].pd, "");
    }
}
