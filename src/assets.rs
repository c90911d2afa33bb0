//! Asset Registry - integer-keyed images in the object store
//!
//! ## Layout
//! ```text
//! images/<category>/<id>.<ext>      e.g. images/items/6.webp
//! ```
//! Ids are allocated per category as `max(existing) + 1`. Allocation scans the
//! prefix and is not locked: two concurrent uploads can pick the same id and
//! the later write wins. Deleted ids leave gaps.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Method;
use futures_util::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::S3Config;

/// Lifetime of URLs handed out with single entities and uploads.
pub const SIGN_TTL: Duration = Duration::from_secs(60 * 60);
/// Lifetime of URLs handed out by asset listings.
pub const LIST_SIGN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid asset payload: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Items,
    Perks,
    Enemies,
    Settlements,
    Expeditions,
    Quests,
    Talents,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 7] = [
        AssetCategory::Items,
        AssetCategory::Perks,
        AssetCategory::Enemies,
        AssetCategory::Settlements,
        AssetCategory::Expeditions,
        AssetCategory::Quests,
        AssetCategory::Talents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Items => "items",
            AssetCategory::Perks => "perks",
            AssetCategory::Enemies => "enemies",
            AssetCategory::Settlements => "settlements",
            AssetCategory::Expeditions => "expeditions",
            AssetCategory::Quests => "quests",
            AssetCategory::Talents => "talents",
        }
    }

    /// Singular label used in endpoint names (`uploadItemAsset`).
    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::Items => "Item",
            AssetCategory::Perks => "Perk",
            AssetCategory::Enemies => "Enemy",
            AssetCategory::Settlements => "Settlement",
            AssetCategory::Expeditions => "Expedition",
            AssetCategory::Quests => "Quest",
            AssetCategory::Talents => "Talent",
        }
    }

    /// Every category is stored as webp; the tool converts before upload.
    pub fn extension(self) -> &'static str {
        "webp"
    }

    pub fn content_type(self) -> &'static str {
        "image/webp"
    }

    pub fn prefix(self) -> String {
        format!("images/{}/", self.as_str())
    }

    pub fn key(self, id: i32) -> String {
        format!("images/{}/{}.{}", self.as_str(), id, self.extension())
    }

    /// Parse the numeric id out of a key inside this category.
    pub fn parse_key(self, key: &str) -> Option<i32> {
        let file = key.strip_prefix(&self.prefix())?;
        let stem = file.strip_suffix(&format!(".{}", self.extension()))?;
        stem.parse::<i32>().ok().filter(|id| *id > 0)
    }
}

// ============================================================================
// Blob store seam
// ============================================================================

/// Minimal object-store surface the registry needs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Keys under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetError>;
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AssetError>;
    /// Time-limited GET URL for `key`.
    async fn sign(&self, key: &str, ttl: Duration) -> Result<String, AssetError>;
}

/// S3-compatible bucket.
pub struct S3BlobStore {
    store: AmazonS3,
}

impl S3BlobStore {
    pub fn new(config: &S3Config) -> Result<Self, AssetError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.with_access_key_id(key).with_secret_access_key(secret);
        }
        let store = builder.build()?;
        info!("Object store bucket: {}", config.bucket);
        Ok(Self { store })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetError> {
        let prefix = Path::from(prefix.trim_end_matches('/'));
        let objects: Vec<_> = self.store.list(Some(&prefix)).try_collect().await?;
        Ok(objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AssetError> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        self.store
            .put_opts(
                &Path::from(key),
                PutPayload::from(bytes),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn sign(&self, key: &str, ttl: Duration) -> Result<String, AssetError> {
        let url = self
            .store
            .signed_url(Method::GET, &Path::from(key), ttl)
            .await?;
        Ok(url.to_string())
    }
}

/// In-process store for tests and local runs without a bucket.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.read().get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetError> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AssetError> {
        self.objects
            .write()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn sign(&self, key: &str, ttl: Duration) -> Result<String, AssetError> {
        if !self.objects.read().contains_key(key) {
            return Err(AssetError::NotFound(key.to_string()));
        }
        Ok(format!("memory://{}?expires={}", key, ttl.as_secs()))
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub id: i32,
    pub url: String,
}

#[derive(Clone)]
pub struct AssetRegistry {
    store: Arc<dyn BlobStore>,
}

impl AssetRegistry {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    async fn ids(&self, category: AssetCategory) -> Result<Vec<i32>, AssetError> {
        let mut ids: Vec<i32> = self
            .store
            .list(&category.prefix())
            .await?
            .iter()
            .filter_map(|key| category.parse_key(key))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    pub async fn next_id(&self, category: AssetCategory) -> Result<i32, AssetError> {
        let max = self.ids(category).await?.last().copied().unwrap_or(0);
        Ok(max + 1)
    }

    /// Store a new asset under the next free id and return `(id, url)`.
    /// The url is empty when signing fails.
    pub async fn put(
        &self,
        category: AssetCategory,
        bytes: Vec<u8>,
    ) -> Result<(i32, String), AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::InvalidPayload("empty asset data".to_string()));
        }
        let id = self.next_id(category).await?;
        let key = category.key(id);
        self.store.put(&key, bytes, category.content_type()).await?;
        info!("Stored asset {}", key);
        // The blob is stored; an unsignable URL is reported as empty.
        let url = self.url_or_empty(category, id, SIGN_TTL).await;
        Ok((id, url))
    }

    pub async fn list(&self, category: AssetCategory) -> Result<Vec<AssetEntry>, AssetError> {
        let ids = self.ids(category).await?;
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let url = self.url_or_empty(category, id, LIST_SIGN_TTL).await;
            entries.push(AssetEntry { id, url });
        }
        Ok(entries)
    }

    pub async fn sign(
        &self,
        category: AssetCategory,
        id: i32,
        ttl: Duration,
    ) -> Result<String, AssetError> {
        self.store.sign(&category.key(id), ttl).await
    }

    /// Signed URL, or an empty string when signing fails.
    pub async fn url_or_empty(&self, category: AssetCategory, id: i32, ttl: Duration) -> String {
        match self.sign(category, id, ttl).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Could not sign {}: {}", category.key(id), e);
                String::new()
            }
        }
    }

    /// URL for an optional asset reference; `None` when no asset is set.
    pub async fn url_for(&self, category: AssetCategory, id: Option<i32>) -> Option<String> {
        match id {
            Some(id) if id > 0 => Some(self.url_or_empty(category, id, SIGN_TTL).await),
            Some(id) => {
                debug!("Ignoring non-positive asset id {}", id);
                None
            }
            None => None,
        }
    }
}
