//! Quest chain endpoints
//!
//! Endpoints:
//! - GET  /api/getQuests
//! - POST /api/createQuest         `{name, description?, settlementId?, assetID?}`
//! - POST /api/saveQuest
//! - POST /api/deleteQuestOption   `{optionId}`
//! - POST /api/deleteQuest         `{questId}`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::expeditions::OptionRef;
use super::{ApiJson, ApiState};
use crate::assets::AssetCategory;
use crate::auth::Principal;
use crate::storage::quests::{NewQuestChain, QuestGraph};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getQuests", get(list_quests))
        .route("/createQuest", post(create_quest))
        .route("/saveQuest", post(save_quest))
        .route("/deleteQuestOption", post(delete_option))
        .route("/deleteQuest", post(delete_quest))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRef {
    pub quest_id: i32,
}

async fn list_quests(State(state): State<ApiState>) -> ApiResult {
    let mut chains = state.pg.list_quest_chains().await?;
    for chain in &mut chains {
        chain.asset_url = state
            .assets
            .url_for(AssetCategory::Quests, chain.asset_id)
            .await;
        for quest in &mut chain.quests {
            quest.asset_url = state
                .assets
                .url_for(AssetCategory::Quests, quest.asset_id)
                .await;
        }
    }
    Ok(success(json!({ "chains": chains })))
}

async fn create_quest(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<NewQuestChain>,
) -> ApiResult {
    let chain_id = state.pg.create_quest_chain(&req).await?;
    info!("{} created quest chain {}", principal.0, chain_id);
    Ok(success(json!({ "chainId": chain_id })))
}

async fn save_quest(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(graph): ApiJson<QuestGraph>,
) -> ApiResult {
    let saved = state.pg.save_quest_chain(&graph).await?;
    info!(
        "{} saved quest chain {} ({} quests submitted)",
        principal.0,
        saved.chain_id,
        graph.quests.len()
    );
    Ok(success(json!(saved)))
}

async fn delete_option(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<OptionRef>,
) -> ApiResult {
    state.pg.delete_quest_option(req.option_id).await?;
    info!("{} deleted quest option {}", principal.0, req.option_id);
    Ok(success(json!({})))
}

async fn delete_quest(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<QuestRef>,
) -> ApiResult {
    state.pg.delete_quest(req.quest_id).await?;
    info!("{} deleted quest {}", principal.0, req.quest_id);
    Ok(success(json!({})))
}
