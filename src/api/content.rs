//! Content authoring endpoints, one set per content kind.
//!
//! Endpoints (for `Item`/`Items`, `Perk`/`Perks`, `Enemy`/`Enemies`,
//! `Talent`/`Talents`):
//! - GET  /api/get<Plural>
//! - POST /api/create<Singular>
//! - POST /api/toggleApprove<Singular>
//! - POST /api/merge<Plural>
//! - POST /api/removePending<Singular>
//!
//! Plus the read-only effect catalogue: GET /api/getEffects

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::{ApiJson, ApiState};
use crate::auth::Principal;
use crate::storage::{Content, Enemy, Item, Perk, Talent};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getEffects", get(list_effects))
        .merge(kind_routes::<Item>())
        .merge(kind_routes::<Perk>())
        .merge(kind_routes::<Enemy>())
        .merge(kind_routes::<Talent>())
}

fn kind_routes<T: Content>() -> Router<ApiState> {
    Router::new()
        .route(&format!("/get{}", T::PLURAL), get(list::<T>))
        .route(&format!("/create{}", T::SINGULAR), post(create::<T>))
        .route(&format!("/toggleApprove{}", T::SINGULAR), post(toggle_approve::<T>))
        .route(&format!("/merge{}", T::PLURAL), post(merge::<T>))
        .route(&format!("/removePending{}", T::SINGULAR), post(remove_pending::<T>))
}

// ============================================================================
// Request Types
// ============================================================================

/// Typed attributes plus the optional update target or pending row.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest<T> {
    #[serde(default, alias = "targetId")]
    pub game_id: Option<i32>,
    #[serde(default)]
    pub tooling_id: Option<i32>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolingRef {
    pub tooling_id: i32,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_effects(State(state): State<ApiState>) -> ApiResult {
    let effects = state.pg.list_effects().await?;
    Ok(success(json!({ "effects": effects })))
}

async fn list<T: Content>(State(state): State<ApiState>) -> ApiResult {
    let mut live = state.pg.list_live::<T>().await?;
    for record in &mut live {
        record.asset_url = state
            .assets
            .url_for(T::CATEGORY, record.data.asset_id())
            .await;
    }
    let pending = state.pg.list_pending::<T>().await?;

    let mut body = json!({ "pending": pending });
    body[T::PLURAL.to_lowercase()] = json!(live);
    Ok(success(body))
}

async fn create<T: Content>(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<CreateRequest<T>>,
) -> ApiResult {
    let authored = match req.tooling_id {
        Some(tooling_id) => state.pg.revise_pending(tooling_id, &req.data).await?,
        None => state.pg.create_pending(&req.data, req.game_id).await?,
    };
    info!(
        "{} authored pending {} {} ({})",
        principal.0,
        T::SINGULAR.to_lowercase(),
        authored.tooling_id,
        authored.action
    );
    Ok(success(json!({
        "toolingId": authored.tooling_id,
        "action": authored.action,
    })))
}

async fn toggle_approve<T: Content>(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<ToolingRef>,
) -> ApiResult {
    let approved = state.pg.toggle_approve::<T>(req.tooling_id).await?;
    info!(
        "{} set approval of pending {} {} to {}",
        principal.0,
        T::SINGULAR.to_lowercase(),
        req.tooling_id,
        approved
    );
    Ok(success(json!({
        "toolingId": req.tooling_id,
        "approved": approved,
    })))
}

async fn merge<T: Content>(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult {
    let report = state.pg.merge::<T>().await?;
    info!("{} merged {}", principal.0, T::TABLE);
    Ok(success(json!(report)))
}

async fn remove_pending<T: Content>(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<ToolingRef>,
) -> ApiResult {
    state.pg.remove_pending::<T>(req.tooling_id).await?;
    info!(
        "{} discarded pending {} {}",
        principal.0,
        T::SINGULAR.to_lowercase(),
        req.tooling_id
    );
    Ok(success(json!({})))
}
