//! Read-only progress aggregation over the Row and Label stores.

use std::collections::{HashMap, HashSet};

use labeldesk_core::error::CoreError;
use labeldesk_core::labeling::LabelingPolicy;
use labeldesk_core::progress::{AnnotatorProgress, DatasetProgress};
use labeldesk_core::roles::Role;
use labeldesk_core::types::DbId;
use labeldesk_db::models::dataset::DatasetSummary;
use labeldesk_db::repositories::{DatasetRepo, ProgressRepo};
use sqlx::PgPool;

use crate::error::AppResult;

/// Completion figures for one dataset.
pub async fn dataset_progress(
    pool: &PgPool,
    policy: &LabelingPolicy,
    dataset_id: DbId,
) -> AppResult<DatasetProgress> {
    let counts = ProgressRepo::dataset_counts(pool, dataset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Dataset",
            id: dataset_id,
        })?;
    Ok(DatasetProgress::from_counts(dataset_id, counts, policy))
}

/// Label counts per annotator, as a share of the dataset's rows.
pub async fn annotator_progress(
    pool: &PgPool,
    dataset_id: DbId,
) -> AppResult<Vec<AnnotatorProgress>> {
    let counts = ProgressRepo::dataset_counts(pool, dataset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Dataset",
            id: dataset_id,
        })?;
    let rows = ProgressRepo::annotator_counts(pool, dataset_id).await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            AnnotatorProgress::new(r.user_id, r.name, r.email, r.labeled_count, counts.total_rows)
        })
        .collect())
}

/// Datasets the caller may see, with progress, in dataset id order.
///
/// Ordering for non-privileged callers is randomized by the handler, not
/// here.
pub async fn visible_datasets(
    pool: &PgPool,
    policy: &LabelingPolicy,
    user_id: DbId,
    role: Role,
) -> AppResult<Vec<DatasetSummary>> {
    let datasets = DatasetRepo::list(pool).await?;
    let counts: HashMap<DbId, _> = ProgressRepo::all_dataset_counts(pool)
        .await?
        .into_iter()
        .collect();
    let contributed: HashSet<DbId> = if role.is_privileged() {
        HashSet::new()
    } else {
        ProgressRepo::contributed_dataset_ids(pool, user_id)
            .await?
            .into_iter()
            .collect()
    };

    Ok(datasets
        .into_iter()
        .map(|dataset| {
            let progress = DatasetProgress::from_counts(
                dataset.id,
                counts.get(&dataset.id).copied().unwrap_or_default(),
                policy,
            );
            DatasetSummary { dataset, progress }
        })
        .filter(|s| {
            s.progress
                .visible_to(role, contributed.contains(&s.dataset.id), policy)
        })
        .collect())
}
