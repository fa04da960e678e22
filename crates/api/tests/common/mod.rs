#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use labeldesk_api::auth::jwt::{generate_access_token, JwtConfig};
use labeldesk_api::auth::password::hash_password;
use labeldesk_api::config::ServerConfig;
use labeldesk_api::router::build_app_router;
use labeldesk_api::state::AppState;
use labeldesk_core::ingest::TranscriptFields;
use labeldesk_core::labeling::{Judgment, LabelFlag, LabelingPolicy};
use labeldesk_core::roles::Role;
use labeldesk_core::types::DbId;
use labeldesk_db::models::user::{CreateUser, User};
use labeldesk_db::repositories::{DatasetRepo, LogRowRepo, UserRepo};

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults and the given policy.
pub fn test_config(policy: LabelingPolicy) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        policy,
    }
}

/// Build the full application router (same middleware stack as production)
/// with the default labeling policy.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_policy(pool, LabelingPolicy::default())
}

pub fn build_test_app_with_policy(pool: PgPool, policy: LabelingPolicy) -> Router {
    let config = test_config(policy);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A policy with a small per-row quota.
pub fn policy_with_quota(labels_per_row: i64) -> LabelingPolicy {
    LabelingPolicy {
        labels_per_row,
        ..LabelingPolicy::default()
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a user directly in the database with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, name: &str, role: Role) -> User {
    let input = CreateUser {
        name: name.to_string(),
        email: format!("{name}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// A bearer token for the user, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, user.role, &test_config(LabelingPolicy::default()).jwt)
        .expect("token generation should succeed")
}

pub fn transcript_rows(n: usize) -> Vec<TranscriptFields> {
    (0..n)
        .map(|i| TranscriptFields {
            engagement_id: "ENG-1".into(),
            timestamp: format!("00:00:{i:02}"),
            speaker: if i % 2 == 0 { "Optometrist" } else { "Patient" }.into(),
            utterance: format!("line {i}"),
            ..TranscriptFields::default()
        })
        .collect()
}

/// Insert a dataset with `n` rows and return its id and row ids in ordinal
/// order.
pub async fn seed_dataset(pool: &PgPool, owner: &User, n: usize) -> (DbId, Vec<DbId>) {
    let dataset = DatasetRepo::create_with_rows(pool, "seeded", owner.id, &transcript_rows(n))
        .await
        .expect("ingestion should succeed");
    let row_ids = LogRowRepo::list_by_dataset(pool, dataset.id)
        .await
        .expect("listing rows should succeed")
        .into_iter()
        .map(|r| r.id)
        .collect();
    (dataset.id, row_ids)
}

pub fn judgment(step: &str) -> Judgment {
    Judgment {
        step: step.to_string(),
        substep: String::new(),
        intent: "confirm_reading".to_string(),
        intent_confidence: 8,
        patient_confidence: 6,
        flag: LabelFlag::Green,
        reason: None,
    }
}

/// Push a lease's grant time into the past.
pub async fn age_lease(pool: &PgPool, row_id: DbId, minutes: i32) {
    sqlx::query(
        "UPDATE row_assignments SET assigned_at = NOW() - make_interval(mins => $2) \
         WHERE log_row_id = $1 AND status = 'active'",
    )
    .bind(row_id)
    .bind(minutes)
    .execute(pool)
    .await
    .expect("aging lease should succeed");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should be served")
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(t) => builder.header("authorization", format!("Bearer {t}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        request(Method::POST, uri, None)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// POST with no body and no content type.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_csv_auth(app: Router, uri: &str, csv: &str, token: &str) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token))
            .header("content-type", "text/csv")
            .body(Body::from(csv.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("body should be UTF-8")
}
