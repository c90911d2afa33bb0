//! Tower Admin Server Library
//!
//! Backend for the content-authoring tool of the Tower RPG:
//! - Staged content (items, perks, enemies, talents) with approval and merge
//! - Expedition and quest graph authoring
//! - Settlements, NPCs, moderation words, server instances
//! - Asset registry over an S3-compatible bucket
//! - Generative-text proxy for quest drafting

pub mod api; // HTTP/JSON endpoints for the authoring tool
pub mod assets; // Image registry and signed URLs
pub mod auth; // Bearer token verification
pub mod config; // Environment configuration
pub mod generate; // Generative-text upstream client
pub mod graph; // Client-local vs server ids
pub mod storage; // PostgreSQL live/pending/management schemas

// Re-export commonly used types
pub use api::{build_router, ApiState};
pub use assets::{AssetCategory, AssetRegistry, BlobStore, MemoryBlobStore, S3BlobStore};
pub use auth::{KeySet, Principal};
pub use config::AppConfig;
pub use generate::TextGenerator;
pub use storage::postgres::PostgresStore;
