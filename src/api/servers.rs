//! Server instance endpoints
//!
//! Endpoints:
//! - GET  /api/getServers
//! - POST /api/createServer   `{name?, endsAt?}`
//! - POST /api/deleteServer   `{id}`

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiResult};
use super::settlements::IdRef;
use super::{ApiJson, ApiState};
use crate::auth::Principal;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/getServers", get(list_servers))
        .route("/createServer", post(create_server))
        .route("/deleteServer", post(delete_server))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

async fn list_servers(State(state): State<ApiState>) -> ApiResult {
    let servers = state.pg.list_servers().await?;
    Ok(success(json!({ "servers": servers })))
}

async fn create_server(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<CreateServerRequest>,
) -> ApiResult {
    let server = state
        .pg
        .create_server(req.name.as_deref(), req.ends_at)
        .await?;
    info!("{} created server instance {}", principal.0, server.id);
    Ok(success(json!({ "server": server })))
}

async fn delete_server(
    State(state): State<ApiState>,
    Extension(principal): Extension<Principal>,
    ApiJson(req): ApiJson<IdRef>,
) -> ApiResult {
    state.pg.delete_server(req.id).await?;
    info!("{} deleted server instance {}", principal.0, req.id);
    Ok(success(json!({})))
}
