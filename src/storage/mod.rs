//! Storage Layer - PostgreSQL access for the authoring backend
//!
//! One [`PostgresStore`] owns the pool; each domain module adds its
//! operations to it in a separate `impl` block.
//!
//! ## Layout
//! ```text
//! [API handlers]
//!       ↓
//! PostgresStore
//! ├── content      live/pending repository + merge (items, perks, enemies, talents)
//! ├── expeditions  slide/option/outcome graphs
//! ├── quests       chain/quest/option/requirement graphs
//! ├── settlements, npcs, effects
//! └── moderation, servers   (management schema, with notifications)
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let pg = PostgresStore::new("postgres://...", 10).await?;
//! let pending = pg.create_pending(&item, None).await?;
//! pg.toggle_approve::<Item>(pending.tooling_id).await?;
//! let report = pg.merge::<Item>().await?;
//! ```

pub mod content;
pub mod effects;
pub mod expeditions;
pub mod kinds;
pub mod migrations;
pub mod moderation;
pub mod npcs;
pub mod postgres;
pub mod quests;
pub mod servers;
pub mod settlements;

pub use content::{Content, LiveRecord, MergeReport, PendingAction, PendingRecord};
pub use kinds::{Enemy, Item, Perk, Talent};
pub use postgres::{PostgresError, PostgresStore};
