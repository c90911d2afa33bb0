//! Banned-word endpoints
//!
//! Endpoints:
//! - GET  /api/getBannedWords
//! - POST /api/addBannedWord      `{word, severity?}`
//! - POST /api/removeBannedWord   `{id}`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::settlements::IdRef;
use super::{ApiJson, ApiState};
use crate::auth::Principal;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getBannedWords", get(list_words))
        .route("/addBannedWord", post(add_word))
        .route("/removeBannedWord", post(remove_word))
}

#[derive(Deserialize)]
pub struct AddWordRequest {
    pub word: String,
    #[serde(default = "default_severity")]
    pub severity: i32,
}

fn default_severity() -> i32 {
    1
}

async fn list_words(State(state): State<ApiState>) -> ApiResult {
    let words = state.pg.list_banned_words().await?;
    Ok(success(json!({ "words": words })))
}

async fn add_word(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<AddWordRequest>,
) -> ApiResult {
    let word = state.pg.add_banned_word(&req.word, req.severity).await?;
    info!("{} banned word {}", principal.0, word.id);
    Ok(success(json!({ "word": word })))
}

async fn remove_word(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<IdRef>,
) -> ApiResult {
    let word = state.pg.remove_banned_word(req.id).await?;
    info!("{} unbanned word {}", principal.0, word.id);
    Ok(success(json!({ "word": word })))
}
