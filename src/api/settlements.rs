//! Settlement endpoints
//!
//! Endpoints:
//! - GET  /api/getSettlements
//! - POST /api/saveSettlement     (insert without `id`, update with it)
//! - POST /api/deleteSettlement   `{id}`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::{ApiJson, ApiState};
use crate::assets::AssetCategory;
use crate::auth::Principal;
use crate::storage::settlements::Settlement;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getSettlements", get(list_settlements))
        .route("/saveSettlement", post(save_settlement))
        .route("/deleteSettlement", post(delete_settlement))
}

/// `{id}` body shared by the simple delete endpoints.
#[derive(Deserialize)]
pub struct IdRef {
    pub id: i32,
}

async fn list_settlements(State(state): State<ApiState>) -> ApiResult {
    let mut settlements = state.pg.list_settlements().await?;
    for settlement in &mut settlements {
        settlement.asset_url = state
            .assets
            .url_for(AssetCategory::Settlements, settlement.asset_id)
            .await;
    }
    Ok(success(json!({ "settlements": settlements })))
}

async fn save_settlement(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(settlement): ApiJson<Settlement>,
) -> ApiResult {
    let id = state.pg.save_settlement(&settlement).await?;
    info!("{} saved settlement {}", principal.0, id);
    Ok(success(json!({ "id": id })))
}

async fn delete_settlement(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<IdRef>,
) -> ApiResult {
    state.pg.delete_settlement(req.id).await?;
    info!("{} deleted settlement {}", principal.0, req.id);
    Ok(success(json!({})))
}
