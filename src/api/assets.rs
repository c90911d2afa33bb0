//! Asset endpoints, one pair per category.
//!
//! Endpoints (for Item, Perk, Enemy, Settlement, Expedition, Quest, Talent):
//! - GET  /api/get<Category>Assets
//! - POST /api/upload<Category>Asset   `{filename?, data}` (base64)

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{success, ApiError, ApiResult};
use super::{ApiJson, ApiState};
use crate::assets::AssetCategory;
use crate::auth::Principal;

pub fn routes() -> Router<ApiState> {
    let mut router = Router::new();
    for category in AssetCategory::ALL {
        router = router
            .route(
                &format!("/get{}Assets", category.label()),
                get(move |State(state): State<ApiState>| list_assets(state, category)),
            )
            .route(
                &format!("/upload{}Asset", category.label()),
                post(
                    move |State(state): State<ApiState>,
                          Extension(principal): Extension<Principal>,
                          ApiJson(req): ApiJson<UploadRequest>| {
                        upload_asset(state, principal, category, req)
                    },
                ),
            );
    }
    router
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: Option<String>,
    pub data: String,
}

/// Decode upload data, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_upload(data: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| ApiError::BadRequest("data: data URL is not base64".to_string()))?,
        None => data,
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::BadRequest(format!("data: invalid base64 ({})", e)))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("data: must not be empty".to_string()));
    }
    Ok(bytes)
}

async fn list_assets(state: ApiState, category: AssetCategory) -> ApiResult {
    let assets = state.assets.list(category).await?;
    Ok(success(json!({ "assets": assets })))
}

async fn upload_asset(
    state: ApiState,
    principal: Principal,
    category: AssetCategory,
    req: UploadRequest,
) -> ApiResult {
    let bytes = decode_upload(&req.data)?;
    let size = bytes.len();
    let (id, url) = state.assets.put(category, bytes).await?;
    info!(
        "{} uploaded {} asset {} ({} bytes, from {})",
        principal.0,
        category.as_str(),
        id,
        size,
        req.filename.as_deref().unwrap_or("unnamed")
    );
    Ok(success(json!({ "assetId": id, "url": url })))
}
