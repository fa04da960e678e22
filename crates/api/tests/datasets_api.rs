//! HTTP-level tests for dataset upload, listing visibility, progress,
//! deletion, and export.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, body_text, create_user, delete_auth, get_auth, judgment, post_csv_auth,
    seed_dataset, token_for,
};
use labeldesk_core::labeling::LabelingPolicy;
use labeldesk_core::roles::Role;
use labeldesk_db::repositories::LabelRepo;
use sqlx::PgPool;

const UPLOAD_CSV: &str = "\
Session_ID,timestamp,Speaker,Utterance,R SPH
S1,00:01,Optometrist,Read the top line,-1.25
S1,00:01,Optometrist,Read the top line,-1.25
S1,00:02,Patient,E F P,-1.25
";

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_upload_normalizes_and_dedupes(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_csv_auth(app.clone(), "/api/v1/datasets?name=Visit%201", UPLOAD_CSV, &token)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Visit 1");
    assert_eq!(json["data"]["row_count"], 2);
    assert_eq!(json["data"]["duplicates_removed"], 1);

    let id = json["data"]["id"].as_i64().unwrap();
    let response = get_auth(app, &format!("/api/v1/spreadsheet/{id}/rows"), &token).await;
    let rows = body_json(response).await;
    let rows = rows["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["row_index"], 0);
    assert_eq!(rows[0]["engagement_id"], "S1");
    assert_eq!(rows[0]["r_sph"], "-1.25");
    assert_eq!(rows[1]["utterance"], "E F P");
    assert!(rows[1]["label"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_missing_column_stores_nothing(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let csv = "Engagement_ID,timestamp,Utterance_Text\nE1,00:01,hello\n";
    let response = post_csv_auth(app.clone(), "/api/v1/datasets?name=broken", csv, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Missing required column: Speaker"));

    let response = get_auth(app, "/api/v1/datasets", &token).await;
    assert_eq!(body_json(response).await["data"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_non_admin_cannot_upload_or_delete(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let ann = create_user(&pool, "ann", Role::Labeler).await;
    let (dataset_id, _) = seed_dataset(&pool, &admin, 1).await;
    let token = token_for(&ann);
    let app = common::build_test_app(pool);

    let response = post_csv_auth(app.clone(), "/api/v1/datasets?name=x", UPLOAD_CSV, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app, &format!("/api/v1/datasets/{dataset_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_completed_dataset_hidden_from_annotators(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let ann = create_user(&pool, "ann", Role::Labeler).await;
    let other = create_user(&pool, "other", Role::Labeler).await;
    let (done, done_rows) = seed_dataset(&pool, &admin, 1).await;
    let (open, _) = seed_dataset(&pool, &admin, 1).await;
    LabelRepo::upsert(&pool, done_rows[0], other.id, &judgment("x"))
        .await
        .unwrap();
    let app = common::build_test_app_with_policy(pool, common::policy_with_quota(1));

    let response = get_auth(app.clone(), "/api/v1/datasets", &token_for(&ann)).await;
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![open]);

    let response = get_auth(app, "/api/v1/datasets", &token_for(&admin)).await;
    let json = body_json(response).await;
    let listed = json["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], done);
    assert_eq!(listed[0]["progress"]["is_complete"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_saturated_dataset_hidden_from_newcomers_only(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let veteran = create_user(&pool, "veteran", Role::Labeler).await;
    let newcomer = create_user(&pool, "newcomer", Role::Labeler).await;
    let (dataset_id, rows) = seed_dataset(&pool, &admin, 2).await;
    LabelRepo::upsert(&pool, rows[0], veteran.id, &judgment("x"))
        .await
        .unwrap();
    let policy = LabelingPolicy {
        saturation_annotators: 1,
        ..LabelingPolicy::default()
    };
    let app = common::build_test_app_with_policy(pool, policy);

    let response = get_auth(app.clone(), "/api/v1/datasets", &token_for(&veteran)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], dataset_id);

    let response = get_auth(app, "/api/v1/datasets", &token_for(&newcomer)).await;
    assert_eq!(body_json(response).await["data"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_progress_endpoints(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let ann = create_user(&pool, "ann", Role::Labeler).await;
    let (dataset_id, rows) = seed_dataset(&pool, &admin, 4).await;
    LabelRepo::upsert(&pool, rows[0], ann.id, &judgment("x")).await.unwrap();
    LabelRepo::upsert(&pool, rows[1], ann.id, &judgment("x")).await.unwrap();
    let app = common::build_test_app_with_policy(pool, common::policy_with_quota(2));

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/datasets/{dataset_id}/progress"),
        &token_for(&ann),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_rows"], 4);
    assert_eq!(json["data"]["labeled_rows"], 2);
    assert_eq!(json["data"]["target_labels"], 8);
    assert_eq!(json["data"]["percent_complete"], 25);
    assert_eq!(json["data"]["is_complete"], false);

    let uri = format!("/api/v1/spreadsheet/{dataset_id}/progress");
    let response = get_auth(app.clone(), &uri, &token_for(&ann)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), &uri, &token_for(&admin)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["email"], "ann@test.com");
    assert_eq!(json["data"][0]["labeled_count"], 2);
    assert_eq!(json["data"][0]["percentage"], 50);

    let response = get_auth(app, "/api/v1/datasets/999999/progress", &token_for(&ann)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_dataset(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let (dataset_id, _) = seed_dataset(&pool, &admin, 2).await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/datasets/{dataset_id}");
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_export_is_attributed(pool: PgPool) {
    let admin = create_user(&pool, "admin", Role::Admin).await;
    let ann = create_user(&pool, "ann", Role::Labeler).await;
    let (dataset_id, rows) = seed_dataset(&pool, &admin, 2).await;
    LabelRepo::upsert(&pool, rows[1], ann.id, &judgment("refraction"))
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/datasets/{dataset_id}/export");
    let response = get_auth(app.clone(), &uri, &token_for(&ann)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, &uri, &token_for(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2, "header plus one labeled row");
    assert!(lines[0].ends_with("Labeled_By,Labeled_At"));
    assert!(lines[1].contains("line 1"));
    assert!(lines[1].contains("refraction"));
    assert!(lines[1].contains("ann@test.com"));
}
