//! Generative-text proxy: POST /api/generateQuestAi
//!
//! The upstream status and body are returned verbatim, so this handler does
//! not use the JSON envelope on success.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Router};
use serde_json::Value;
use tracing::info;

use super::{ApiError, ApiJson, ApiState};
use crate::auth::Principal;

pub fn routes() -> Router<ApiState> {
    Router::new().route("/generateQuestAi", post(generate_quest))
}

async fn generate_quest(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(payload): ApiJson<Value>,
) -> Result<Response, ApiError> {
    info!("{} requested a quest generation", principal.0);
    let upstream = state.generator.forward(payload).await?;
    let content_type = upstream
        .content_type
        .unwrap_or_else(|| "application/json".to_string());
    Ok((
        upstream.status,
        [(header::CONTENT_TYPE, content_type)],
        upstream.body,
    )
        .into_response())
}
