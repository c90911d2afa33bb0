//! HTTP/JSON API Layer
//!
//! Every authoring operation is a method-specific route under `/api/`,
//! named after the operation (`getItems`, `createItem`, `saveExpedition`).
//!
//! ## Architecture
//! ```text
//! Authoring tool (browser)
//!       ↓ HTTP, JSON body, bearer token
//! no-store headers → preflight short-circuit
//!       ↓
//! ├── /health, /css/**, /js/**         public
//! ├── /api/**  → require_auth → handlers (content, assets, graphs, ...)
//! └── other    → require_auth → static files
//!       ↓
//! PostgresStore / AssetRegistry / TextGenerator
//! ```

pub mod assets;
pub mod content;
pub mod error;
pub mod expeditions;
pub mod generate;
pub mod moderation;
pub mod npcs;
pub mod quests;
pub mod servers;
pub mod settlements;

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, info};

use crate::assets::AssetRegistry;
use crate::auth::{bearer_token, AuthError, KeySet};
use crate::generate::TextGenerator;
use crate::storage::postgres::PostgresStore;

pub use error::{ApiError, ApiJson, ApiQuery};

/// Shared state available to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub pg: Arc<PostgresStore>,
    pub assets: AssetRegistry,
    pub keys: Arc<KeySet>,
    pub generator: Arc<TextGenerator>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Reject requests without a valid access token; attach the principal.
async fn require_auth(
    State(keys): State<Arc<KeySet>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verdict = match bearer_token(req.headers()) {
        Some(token) => keys.authenticate(token),
        None => Err(AuthError::MissingToken),
    };
    match verdict {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            debug!("{} {} rejected: {}", req.method(), req.uri().path(), e);
            Err(ApiError::Unauthorized)
        }
    }
}

/// Answer preflight requests without touching routing or auth.
async fn preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}

fn api_routes() -> Router<ApiState> {
    Router::new()
        .merge(content::routes())
        .merge(assets::routes())
        .merge(expeditions::routes())
        .merge(quests::routes())
        .merge(settlements::routes())
        .merge(npcs::routes())
        .merge(moderation::routes())
        .merge(servers::routes())
        .merge(generate::routes())
}

/// Build the full router: public health and styles, authenticated API and
/// remaining static files.
pub fn build_router(state: ApiState, static_dir: &Path) -> Router {
    let auth = middleware::from_fn_with_state(state.keys.clone(), require_auth);

    let api = api_routes()
        .route_layer(auth.clone())
        .with_state(state);

    let protected_static = Router::new()
        .fallback_service(ServeDir::new(static_dir))
        .layer(auth);

    Router::new()
        .route("/health", get(health_check))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest("/api", api)
        .fallback_service(protected_static)
        .layer(middleware::from_fn(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
}

/// Start the HTTP API server on the given port and serve until Ctrl-C.
pub async fn start_api_server(
    state: ApiState,
    static_dir: &Path,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_router(state, static_dir);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
