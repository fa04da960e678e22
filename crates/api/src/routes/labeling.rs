//! Route definitions for the lease-based labeling flow.
//!
//! All endpoints require authentication via the `AuthUser` extractor.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::labeling;
use crate::state::AppState;

/// Labeling routes mounted at `/labeling`.
///
/// ```text
/// POST /next        -> next
/// POST /submit      -> submit
/// POST /release     -> release
/// GET  /current     -> current
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next", post(labeling::next))
        .route("/submit", post(labeling::submit))
        .route("/release", post(labeling::release))
        .route("/current", get(labeling::current))
}
