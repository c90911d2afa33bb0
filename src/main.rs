use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tower_admin_server::storage::postgres::MIGRATION_RETRY_INTERVAL;
use tower_admin_server::{
    api::{self, ApiState},
    AppConfig, AssetRegistry, KeySet, PostgresStore, S3BlobStore, TextGenerator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    info!("Starting Tower admin server v{}", env!("CARGO_PKG_VERSION"));

    // ========================================================================
    // 1. Configuration
    // ========================================================================
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        "Config: port={}, bucket={}, region={}, static_dir={}",
        config.port, config.s3.bucket, config.s3.region, config.static_dir
    );

    // ========================================================================
    // 2. PostgreSQL (lazy pool, migrations retried in the background)
    // ========================================================================
    // Connections open lazily; an unreachable database fails requests, not startup.
    let pg = Arc::new(
        PostgresStore::connect_lazy(&config.database_url, config.pg_max_connections)
            .context("invalid DATABASE_URL")?,
    );
    tokio::spawn({
        let pg = pg.clone();
        async move { pg.migrate_with_retry(MIGRATION_RETRY_INTERVAL).await }
    });

    // ========================================================================
    // 3. Signing keys, object store, generative upstream
    // ========================================================================
    let keys = KeySet::fetch(&config.jwks_url)
        .await
        .context("could not load signing keys")?;
    if keys.is_empty() {
        warn!("Key set at {} is empty; every request will be rejected", config.jwks_url);
    }

    let blobs = S3BlobStore::new(&config.s3).context("object store configuration failed")?;

    if config.generate_api_key.is_none() {
        warn!("OPENAI_API_KEY not set; generateQuestAi will answer 500");
    }
    let generator = TextGenerator::new(&config.generate_url, config.generate_api_key.clone());

    let state = ApiState {
        pg,
        assets: AssetRegistry::new(Arc::new(blobs)),
        keys: Arc::new(keys),
        generator: Arc::new(generator),
    };

    // ========================================================================
    // 4. HTTP API (blocks until shutdown)
    // ========================================================================
    api::start_api_server(state, Path::new(&config.static_dir), config.port)
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    info!("Server stopped");
    Ok(())
}
