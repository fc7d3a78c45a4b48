/*
 * Responsibility
 * - Registry API base endpoint (GET /v2/), the route clients probe to learn
 *   whether and how to authenticate
 * - Mounted behind middleware::auth::access by app::build_router
 *   (both /v2 and /v2/, clients use either)
 */
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde_json::json;

use crate::api::v1::extractors::AuthCtxExtractor;
use crate::state::AppState;

const API_VERSION_HEADER: &str = "docker-distribution-api-version";
const API_VERSION: &str = "registry/2.0";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v2", get(base))
        .route("/v2/", get(base))
}

async fn base(AuthCtxExtractor(ctx): AuthCtxExtractor) -> impl IntoResponse {
    tracing::debug!(principal = %ctx.principal, "registry base probe");
    ([(API_VERSION_HEADER, API_VERSION)], Json(json!({})))
}
