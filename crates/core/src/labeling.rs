//! Labeling policy, lease and label enums, and judgment validation.
//!
//! Shared by the lease repository, the labeling engine, and the handlers so
//! that every layer agrees on the lease duration and the per-row quota.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CoreError, UnknownVariant};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Minutes an assignment stays active before it is treated as absent.
pub const DEFAULT_LEASE_DURATION_MINS: i64 = 15;

/// Distinct annotators required before a row counts as fully labeled.
pub const DEFAULT_LABELS_PER_ROW: i64 = 5;

/// Datasets touched by this many annotators are hidden from annotators who
/// have not worked on them yet.
pub const DEFAULT_SATURATION_ANNOTATORS: i64 = 5;

/// Tunable labeling policy. Production reads it from the environment; tests
/// construct it directly with small quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelingPolicy {
    pub lease_duration_mins: i64,
    pub labels_per_row: i64,
    pub saturation_annotators: i64,
}

impl Default for LabelingPolicy {
    fn default() -> Self {
        Self {
            lease_duration_mins: DEFAULT_LEASE_DURATION_MINS,
            labels_per_row: DEFAULT_LABELS_PER_ROW,
            saturation_annotators: DEFAULT_SATURATION_ANNOTATORS,
        }
    }
}

impl LabelingPolicy {
    /// Reject non-positive values, which would make every lease expired or
    /// every row complete.
    pub fn validate(&self) -> Result<(), String> {
        if self.lease_duration_mins < 1 {
            return Err(format!(
                "Lease duration must be at least 1 minute, got {}",
                self.lease_duration_mins
            ));
        }
        if self.labels_per_row < 1 {
            return Err(format!(
                "Labels per row must be at least 1, got {}",
                self.labels_per_row
            ));
        }
        if self.saturation_annotators < 1 {
            return Err(format!(
                "Saturation threshold must be at least 1, got {}",
                self.saturation_annotators
            ));
        }
        Ok(())
    }

    pub fn lease_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.lease_duration_mins)
    }

    /// A lease granted strictly before this instant is expired at `now`.
    pub fn lease_cutoff(&self, now: Timestamp) -> Timestamp {
        now - self.lease_duration()
    }

    pub fn is_lease_expired(&self, granted_at: Timestamp, now: Timestamp) -> bool {
        granted_at < self.lease_cutoff(now)
    }

    pub fn quota_reached(&self, distinct_annotators: i64) -> bool {
        distinct_annotators >= self.labels_per_row
    }
}

// ---------------------------------------------------------------------------
// Assignment status
// ---------------------------------------------------------------------------

/// Lifecycle of a row assignment. Only `Active` leases exist for exclusion
/// and authorization purposes; the rest record how the lease ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    /// Ended by a label submission.
    Completed,
    /// Ended by an explicit release.
    Released,
    /// Reclaimed after the lease duration elapsed.
    Expired,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Released => "released",
            AssignmentStatus::Expired => "expired",
        }
    }

    pub fn is_active(self) -> bool {
        match self {
            AssignmentStatus::Active => true,
            AssignmentStatus::Completed | AssignmentStatus::Released | AssignmentStatus::Expired => {
                false
            }
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssignmentStatus::Active),
            "completed" => Ok(AssignmentStatus::Completed),
            "released" => Ok(AssignmentStatus::Released),
            "expired" => Ok(AssignmentStatus::Expired),
            other => Err(UnknownVariant(format!("Unknown assignment status '{other}'"))),
        }
    }
}

impl TryFrom<String> for AssignmentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Label flag
// ---------------------------------------------------------------------------

/// Tri-state quality flag attached to every label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LabelFlag {
    /// Utterance is fine.
    Green,
    /// Worth a second look.
    Yellow,
    /// Wrong or harmful.
    Red,
}

impl LabelFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelFlag::Green => "GREEN",
            LabelFlag::Yellow => "YELLOW",
            LabelFlag::Red => "RED",
        }
    }
}

impl fmt::Display for LabelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelFlag {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GREEN" => Ok(LabelFlag::Green),
            "YELLOW" => Ok(LabelFlag::Yellow),
            "RED" => Ok(LabelFlag::Red),
            other => Err(UnknownVariant(format!("Unknown label flag '{other}'"))),
        }
    }
}

impl TryFrom<String> for LabelFlag {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Judgment
// ---------------------------------------------------------------------------

/// The annotator-supplied part of a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Judgment {
    #[validate(length(min = 1, message = "step must not be empty"))]
    pub step: String,
    #[serde(default)]
    pub substep: String,
    #[validate(length(min = 1, message = "intent must not be empty"))]
    pub intent: String,
    #[validate(range(min = 0, max = 10, message = "intent_confidence must be between 0 and 10"))]
    pub intent_confidence: i32,
    #[validate(range(min = 0, max = 10, message = "patient_confidence must be between 0 and 10"))]
    pub patient_confidence: i32,
    pub flag: LabelFlag,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Judgment {
    /// Trim text fields and check them against the field rules.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.step = self.step.trim().to_string();
        self.substep = self.substep.trim().to_string();
        self.intent = self.intent.trim().to_string();
        self.reason = self
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        Ok(self)
    }
}
