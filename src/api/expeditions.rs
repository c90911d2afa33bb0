//! Expedition graph endpoints
//!
//! Endpoints:
//! - GET  /api/getExpeditions
//! - GET  /api/getExpedition?id=
//! - POST /api/saveExpedition
//! - POST /api/deleteExpeditionSlide    `{slideId}`
//! - POST /api/deleteExpeditionOption   `{optionId}`
//! - POST /api/deleteExpedition         `{expeditionId}`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::{ApiJson, ApiQuery, ApiState};
use crate::assets::AssetCategory;
use crate::auth::Principal;
use crate::storage::expeditions::ExpeditionGraph;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getExpeditions", get(list_expeditions))
        .route("/getExpedition", get(get_expedition))
        .route("/saveExpedition", post(save_expedition))
        .route("/deleteExpeditionSlide", post(delete_slide))
        .route("/deleteExpeditionOption", post(delete_option))
        .route("/deleteExpedition", post(delete_expedition))
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct ExpeditionQuery {
    pub id: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRef {
    pub slide_id: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRef {
    pub option_id: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpeditionRef {
    pub expedition_id: i32,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_expeditions(State(state): State<ApiState>) -> ApiResult {
    let mut expeditions = state.pg.list_expeditions().await?;
    for expedition in &mut expeditions {
        expedition.asset_url = state
            .assets
            .url_for(AssetCategory::Expeditions, expedition.asset_id)
            .await;
    }
    Ok(success(json!({ "expeditions": expeditions })))
}

async fn get_expedition(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ExpeditionQuery>,
) -> ApiResult {
    let mut expedition = state.pg.get_expedition(query.id).await?;
    expedition.asset_url = state
        .assets
        .url_for(AssetCategory::Expeditions, expedition.asset_id)
        .await;
    for slide in &mut expedition.slides {
        slide.asset_url = state
            .assets
            .url_for(AssetCategory::Expeditions, slide.asset_id)
            .await;
    }
    Ok(success(json!({ "expedition": expedition })))
}

async fn save_expedition(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(graph): ApiJson<ExpeditionGraph>,
) -> ApiResult {
    let saved = state.pg.save_expedition(&graph).await?;
    info!(
        "{} saved expedition {} ({} slides submitted)",
        principal.0,
        saved.expedition_id,
        graph.slides.len()
    );
    Ok(success(json!(saved)))
}

async fn delete_slide(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<SlideRef>,
) -> ApiResult {
    state.pg.delete_expedition_slide(req.slide_id).await?;
    info!("{} deleted expedition slide {}", principal.0, req.slide_id);
    Ok(success(json!({})))
}

async fn delete_option(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<OptionRef>,
) -> ApiResult {
    state.pg.delete_expedition_option(req.option_id).await?;
    info!("{} deleted expedition option {}", principal.0, req.option_id);
    Ok(success(json!({})))
}

async fn delete_expedition(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<ExpeditionRef>,
) -> ApiResult {
    state.pg.delete_expedition(req.expedition_id).await?;
    info!("{} deleted expedition {}", principal.0, req.expedition_id);
    Ok(success(json!({})))
}
