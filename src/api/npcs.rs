//! NPC endpoints: GET /api/getNpcs, POST /api/saveNpc, POST /api/deleteNpc

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::settlements::IdRef;
use super::{ApiJson, ApiState};
use crate::auth::Principal;
use crate::storage::npcs::Npc;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getNpcs", get(list_npcs))
        .route("/saveNpc", post(save_npc))
        .route("/deleteNpc", post(delete_npc))
}

async fn list_npcs(State(state): State<ApiState>) -> ApiResult {
    let npcs = state.pg.list_npcs().await?;
    Ok(success(json!({ "npcs": npcs })))
}

async fn save_npc(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(npc): ApiJson<Npc>,
) -> ApiResult {
    let id = state.pg.save_npc(&npc).await?;
    info!("{} saved npc {}", principal.0, id);
    Ok(success(json!({ "id": id })))
}

async fn delete_npc(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<IdRef>,
) -> ApiResult {
    state.pg.delete_npc(req.id).await?;
    info!("{} deleted npc {}", principal.0, req.id);
    Ok(success(json!({})))
}
