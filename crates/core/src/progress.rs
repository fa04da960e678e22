//! Progress math and dataset visibility rules.
//!
//! The storage layer supplies raw counts; everything derived from them
//! (completion, percentages, who may see a dataset, listing order) is decided
//! here so it can be tested without a database.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::labeling::LabelingPolicy;
use crate::roles::Role;
use crate::types::DbId;

/// Raw per-dataset counts as read from storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetCounts {
    pub total_rows: i64,
    /// Rows with at least one label.
    pub labeled_rows: i64,
    /// Labels across all rows.
    pub label_count: i64,
    /// Distinct annotators with at least one label in the dataset.
    pub annotator_count: i64,
}

/// Derived progress for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetProgress {
    pub dataset_id: DbId,
    pub total_rows: i64,
    pub labeled_rows: i64,
    pub label_count: i64,
    pub annotator_count: i64,
    /// `total_rows * labels_per_row`.
    pub target_labels: i64,
    pub percent_complete: i64,
    pub is_complete: bool,
}

impl DatasetProgress {
    pub fn from_counts(dataset_id: DbId, counts: DatasetCounts, policy: &LabelingPolicy) -> Self {
        let target_labels = counts.total_rows * policy.labels_per_row;
        // An empty dataset is never complete.
        let is_complete = counts.total_rows > 0 && counts.label_count >= target_labels;
        Self {
            dataset_id,
            total_rows: counts.total_rows,
            labeled_rows: counts.labeled_rows,
            label_count: counts.label_count,
            annotator_count: counts.annotator_count,
            target_labels,
            percent_complete: percentage(counts.label_count, target_labels),
            is_complete,
        }
    }

    /// Whether a caller may see this dataset in listings.
    ///
    /// Privileged callers see everything. Others never see completed
    /// datasets, and do not see saturated datasets unless they already
    /// contributed to them.
    pub fn visible_to(&self, role: Role, has_contributed: bool, policy: &LabelingPolicy) -> bool {
        if role.is_privileged() {
            return true;
        }
        if self.is_complete {
            return false;
        }
        has_contributed || self.annotator_count < policy.saturation_annotators
    }
}

/// Per-annotator progress within one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatorProgress {
    pub user_id: DbId,
    pub name: String,
    pub email: String,
    pub labeled_count: i64,
    pub percentage: i64,
}

impl AnnotatorProgress {
    pub fn new(user_id: DbId, name: String, email: String, labeled_count: i64, total_rows: i64) -> Self {
        Self {
            user_id,
            name,
            email,
            labeled_count,
            percentage: percentage(labeled_count, total_rows),
        }
    }
}

/// Integer percentage of `part` over `whole`, floored and capped at 100.
/// Zero when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (part.max(0) * 100 / whole).min(100)
}

/// Reorder a listing for non-privileged callers so load spreads across
/// datasets. Privileged callers keep the storage order.
pub fn shuffle_for<T, R: Rng + ?Sized>(items: &mut [T], role: Role, rng: &mut R) {
    if !role.is_privileged() {
        items.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn policy(k: i64) -> LabelingPolicy {
        LabelingPolicy {
            labels_per_row: k,
            ..LabelingPolicy::default()
        }
    }

    fn counts(total_rows: i64, label_count: i64, annotator_count: i64) -> DatasetCounts {
        DatasetCounts {
            total_rows,
            labeled_rows: label_count.min(total_rows),
            label_count,
            annotator_count,
        }
    }

    #[test]
    fn test_percentage_floors_and_caps() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(7, 3), 100);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn test_empty_dataset_is_not_complete() {
        let p = DatasetProgress::from_counts(1, counts(0, 0, 0), &policy(5));
        assert!(!p.is_complete);
        assert_eq!(p.percent_complete, 0);
    }

    #[test]
    fn test_complete_when_every_row_reaches_quota() {
        let p = DatasetProgress::from_counts(1, counts(3, 5, 2), &policy(2));
        assert!(!p.is_complete);
        assert_eq!(p.target_labels, 6);

        let p = DatasetProgress::from_counts(1, counts(3, 6, 2), &policy(2));
        assert!(p.is_complete);
        assert_eq!(p.percent_complete, 100);
    }

    #[test]
    fn test_completed_dataset_hidden_from_labelers_only() {
        let policy = policy(1);
        let p = DatasetProgress::from_counts(1, counts(2, 2, 1), &policy);
        assert!(p.is_complete);
        assert!(!p.visible_to(Role::Labeler, true, &policy));
        assert!(!p.visible_to(Role::Reviewer, true, &policy));
        assert!(p.visible_to(Role::Admin, false, &policy));
    }

    #[test]
    fn test_saturated_dataset_hidden_from_newcomers() {
        let policy = policy(10);
        let p = DatasetProgress::from_counts(1, counts(100, 20, 5), &policy);
        assert!(!p.visible_to(Role::Labeler, false, &policy));
        assert!(p.visible_to(Role::Labeler, true, &policy));
        assert!(p.visible_to(Role::Admin, false, &policy));

        let p = DatasetProgress::from_counts(1, counts(100, 20, 4), &policy);
        assert!(p.visible_to(Role::Labeler, false, &policy));
    }

    #[test]
    fn test_annotator_progress_percentage() {
        let p = AnnotatorProgress::new(9, "Ana".into(), "ana@example.com".into(), 2, 8);
        assert_eq!(p.percentage, 25);
    }

    #[test]
    fn test_shuffle_is_seedable() {
        let original: Vec<i32> = (0..20).collect();

        let mut a = original.clone();
        let mut b = original.clone();
        shuffle_for(&mut a, Role::Labeler, &mut StdRng::seed_from_u64(7));
        shuffle_for(&mut b, Role::Labeler, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort();
        assert_eq!(sorted, original);
    }

    #[test]
    fn test_privileged_listing_keeps_order() {
        let original: Vec<i32> = (0..20).collect();
        let mut items = original.clone();
        shuffle_for(&mut items, Role::Admin, &mut StdRng::seed_from_u64(7));
        assert_eq!(items, original);
    }
}
