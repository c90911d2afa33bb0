//! Content Repository + Approval & Merge Engine
//!
//! Every editable content type has a live table (`game.<t>`) read by the game
//! and a pending table (`tooling.<t>`) written by the authoring tool. Both
//! carry the same typed attribute columns, described once per type through
//! the [`Content`] trait; the pending table adds `tooling_id`, `game_id`,
//! `action`, `version` and `approved`.
//!
//! ## Lifecycle
//! ```text
//! create_pending ──► tooling.<t> (approved = false)
//!                        │ toggle_approve
//!                        ▼
//!                    approved = true ──merge──► game.<t> (version + 1)
//! ```
//! A merge runs in one transaction. Rows are applied in `tooling_id` order so
//! later edits of the same live row win.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, Postgres, Row};
use tracing::{debug, info, warn};

use super::postgres::{PostgresError, PostgresStore};
use crate::assets::AssetCategory;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A content type with a live and a pending table.
pub trait Content:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    /// Table name shared by `game.` and `tooling.`.
    const TABLE: &'static str;
    /// Attribute columns, in the order `bind_columns` binds them.
    const COLUMNS: &'static [&'static str];
    const CATEGORY: AssetCategory;
    /// Endpoint labels: `createItem`, `getItems`.
    const SINGULAR: &'static str;
    const PLURAL: &'static str;

    fn validate(&self) -> Result<(), PostgresError>;

    /// Bind every attribute in `COLUMNS` order.
    fn bind_columns<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q>;

    fn asset_id(&self) -> Option<i32>;
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Insert,
    Update,
}

impl PendingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingAction::Insert => "insert",
            PendingAction::Update => "update",
        }
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown pending action `{0}`")]
pub struct UnknownAction(String);

impl FromStr for PendingAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(PendingAction::Insert),
            "update" => Ok(PendingAction::Update),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// A row of `game.<t>`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRecord<T> {
    pub id: i32,
    pub version: i32,
    #[serde(flatten)]
    pub data: T,
    /// Filled in by the API layer; empty when signing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
}

impl<'r, T> FromRow<'r, PgRow> for LiveRecord<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            version: row.try_get("version")?,
            data: T::from_row(row)?,
            asset_url: None,
        })
    }
}

/// A row of `tooling.<t>`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord<T> {
    pub tooling_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<i32>,
    pub action: PendingAction,
    /// Live version the edit was authored against.
    pub version: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    /// Current live version, when the target still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_version: Option<i32>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> PendingRecord<T> {
    /// The live row moved on since this edit was authored.
    pub fn is_stale(&self) -> bool {
        self.action == PendingAction::Update
            && self.live_version.is_some_and(|live| live != self.version)
    }
}

impl<'r, T> FromRow<'r, PgRow> for PendingRecord<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let action: String = row.try_get("action")?;
        let action = action.parse().map_err(|e| sqlx::Error::ColumnDecode {
            index: "action".to_string(),
            source: Box::new(e),
        })?;
        let live_version = match row.try_get("live_version") {
            Ok(v) => v,
            Err(sqlx::Error::ColumnNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            tooling_id: row.try_get("tooling_id")?,
            game_id: row.try_get("game_id")?,
            action,
            version: row.try_get("version")?,
            approved: row.try_get("approved")?,
            created_at: row.try_get("created_at")?,
            live_version,
            data: T::from_row(row)?,
        })
    }
}

/// Result of an authoring write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredPending {
    pub tooling_id: i32,
    pub action: PendingAction,
}

/// Outcome of one merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    /// Tooling ids of update rows whose live target no longer exists.
    pub skipped: Vec<i32>,
}

// ============================================================================
// SQL fragments
// ============================================================================

fn column_list(prefix: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{}{}", prefix, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `$start, $start+1, ...` for `count` parameters.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a = $1, b = $2, ...`
fn assignments(columns: &[&str]) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", c, i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

fn not_found<T: Content>(tooling_id: i32) -> PostgresError {
    PostgresError::NotFound(format!(
        "pending {} {}",
        T::SINGULAR.to_lowercase(),
        tooling_id
    ))
}

// ============================================================================
// Operations
// ============================================================================

impl PostgresStore {
    /// All live rows in ascending id order.
    pub async fn list_live<T: Content>(&self) -> Result<Vec<LiveRecord<T>>, PostgresError> {
        let sql = format!(
            "SELECT id, version, {} FROM game.{} ORDER BY id",
            column_list("", T::COLUMNS),
            T::TABLE
        );
        let rows = sqlx::query_as::<_, LiveRecord<T>>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// All pending rows, newest first.
    pub async fn list_pending<T: Content>(&self) -> Result<Vec<PendingRecord<T>>, PostgresError> {
        let sql = format!(
            "SELECT p.tooling_id, p.game_id, p.action, p.version, p.approved, p.created_at,
                    g.version AS live_version, {}
             FROM tooling.{table} p
             LEFT JOIN game.{table} g ON g.id = p.game_id
             ORDER BY p.tooling_id DESC",
            column_list("p.", T::COLUMNS),
            table = T::TABLE
        );
        let rows = sqlx::query_as::<_, PendingRecord<T>>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Write a new pending row: an insert when `target_id` is absent,
    /// otherwise an update of that live row.
    pub async fn create_pending<T: Content>(
        &self,
        data: &T,
        target_id: Option<i32>,
    ) -> Result<AuthoredPending, PostgresError> {
        data.validate()?;

        let (action, version) = match target_id {
            Some(id) => {
                let version: Option<i32> = sqlx::query_scalar(&format!(
                    "SELECT version FROM game.{} WHERE id = $1",
                    T::TABLE
                ))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
                let version = version.ok_or_else(|| {
                    PostgresError::validation(format!(
                        "gameId: no live {} with id {}",
                        T::SINGULAR.to_lowercase(),
                        id
                    ))
                })?;
                (PendingAction::Update, version)
            }
            None => (PendingAction::Insert, 0),
        };

        let n = T::COLUMNS.len();
        let sql = format!(
            "INSERT INTO tooling.{} ({}, game_id, action, version, approved)
             VALUES ({}, ${}, ${}, ${}, FALSE)
             RETURNING tooling_id",
            T::TABLE,
            column_list("", T::COLUMNS),
            placeholders(1, n),
            n + 1,
            n + 2,
            n + 3
        );
        let row = data
            .bind_columns(sqlx::query(&sql))
            .bind(target_id)
            .bind(action.as_str())
            .bind(version)
            .fetch_one(self.pool())
            .await?;
        let tooling_id: i32 = row.try_get("tooling_id")?;

        info!(
            "Pending {} {} written ({}, game_id={:?})",
            T::SINGULAR.to_lowercase(),
            tooling_id,
            action,
            target_id
        );
        Ok(AuthoredPending { tooling_id, action })
    }

    /// Replace the attributes of an existing pending row. Approval is reset.
    pub async fn revise_pending<T: Content>(
        &self,
        tooling_id: i32,
        data: &T,
    ) -> Result<AuthoredPending, PostgresError> {
        data.validate()?;

        let n = T::COLUMNS.len();
        let sql = format!(
            "UPDATE tooling.{} SET {}, approved = FALSE
             WHERE tooling_id = ${}
             RETURNING action",
            T::TABLE,
            assignments(T::COLUMNS),
            n + 1
        );
        let row = data
            .bind_columns(sqlx::query(&sql))
            .bind(tooling_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| not_found::<T>(tooling_id))?;
        let action: String = row.try_get("action")?;
        let action = action
            .parse()
            .map_err(|e: UnknownAction| PostgresError::validation(e.to_string()))?;

        debug!("Pending {} {} revised", T::SINGULAR.to_lowercase(), tooling_id);
        Ok(AuthoredPending { tooling_id, action })
    }

    /// Flip `approved` on one pending row and return the new value.
    pub async fn toggle_approve<T: Content>(&self, tooling_id: i32) -> Result<bool, PostgresError> {
        let approved: Option<bool> = sqlx::query_scalar(&format!(
            "UPDATE tooling.{} SET approved = NOT approved WHERE tooling_id = $1 RETURNING approved",
            T::TABLE
        ))
        .bind(tooling_id)
        .fetch_optional(self.pool())
        .await?;
        approved.ok_or_else(|| not_found::<T>(tooling_id))
    }

    /// Discard a pending row; the live table is untouched.
    pub async fn remove_pending<T: Content>(&self, tooling_id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query(&format!(
            "DELETE FROM tooling.{} WHERE tooling_id = $1",
            T::TABLE
        ))
        .bind(tooling_id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<T>(tooling_id));
        }
        Ok(())
    }

    /// Promote every approved pending row into the live table.
    ///
    /// All-or-nothing: any SQL failure rolls the whole merge back. Update rows
    /// whose live target is gone are skipped, reported and discarded.
    pub async fn merge<T: Content>(&self) -> Result<MergeReport, PostgresError> {
        let n = T::COLUMNS.len();
        let columns = column_list("", T::COLUMNS);
        let select_sql = format!(
            "SELECT tooling_id, game_id, action, version, approved, created_at, {}
             FROM tooling.{}
             WHERE approved
             ORDER BY tooling_id
             FOR UPDATE",
            columns,
            T::TABLE
        );
        let insert_sql = format!(
            "INSERT INTO game.{} ({}, version) VALUES ({}, ${}) RETURNING id",
            T::TABLE,
            columns,
            placeholders(1, n),
            n + 1
        );
        let update_sql = format!(
            "UPDATE game.{} SET {}, version = version + 1 WHERE id = ${} RETURNING version",
            T::TABLE,
            assignments(T::COLUMNS),
            n + 1
        );
        let delete_sql = format!("DELETE FROM tooling.{} WHERE tooling_id = $1", T::TABLE);

        let mut tx = self.begin().await?;
        let pending = sqlx::query_as::<_, PendingRecord<T>>(&select_sql)
            .fetch_all(&mut *tx)
            .await?;

        let mut report = MergeReport::default();
        for row in pending {
            match (row.action, row.game_id) {
                (PendingAction::Insert, _) => {
                    let inserted = row
                        .data
                        .bind_columns(sqlx::query(&insert_sql))
                        .bind(row.version + 1)
                        .fetch_one(&mut *tx)
                        .await?;
                    let game_id: i32 = inserted.try_get("id")?;
                    debug!("Merged pending {} as new live id {}", row.tooling_id, game_id);
                    report.inserted += 1;
                }
                (PendingAction::Update, Some(game_id)) => {
                    let updated = row
                        .data
                        .bind_columns(sqlx::query(&update_sql))
                        .bind(game_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                    match updated {
                        Some(updated) => {
                            let new_version: i32 = updated.try_get("version")?;
                            if new_version - 1 != row.version {
                                info!(
                                    "Pending {} was authored against version {} of {} {}, live was {}",
                                    row.tooling_id,
                                    row.version,
                                    T::SINGULAR.to_lowercase(),
                                    game_id,
                                    new_version - 1
                                );
                            }
                            report.updated += 1;
                        }
                        None => {
                            warn!(
                                "Skipping pending {}: live {} {} no longer exists",
                                row.tooling_id,
                                T::SINGULAR.to_lowercase(),
                                game_id
                            );
                            report.skipped.push(row.tooling_id);
                        }
                    }
                }
                (PendingAction::Update, None) => {
                    warn!("Skipping pending {}: update without game_id", row.tooling_id);
                    report.skipped.push(row.tooling_id);
                }
            }

            sqlx::query(&delete_sql)
                .bind(row.tooling_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(
            "Merged {}: {} inserted, {} updated, {} skipped",
            T::TABLE,
            report.inserted,
            report.updated,
            report.skipped.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1, 3), "$1, $2, $3");
        assert_eq!(placeholders(4, 1), "$4");
        assert_eq!(placeholders(1, 0), "");
    }

    #[test]
    fn test_assignments_and_columns() {
        assert_eq!(assignments(&["name", "silver"]), "name = $1, silver = $2");
        assert_eq!(column_list("p.", &["name", "silver"]), "p.name, p.silver");
    }

    #[test]
    fn test_pending_action_round_trip_through_text() {
        assert_eq!("insert".parse::<PendingAction>().unwrap(), PendingAction::Insert);
        assert_eq!("update".parse::<PendingAction>().unwrap(), PendingAction::Update);
        assert!("upsert".parse::<PendingAction>().is_err());
        assert_eq!(
            serde_json::to_value(PendingAction::Update).unwrap(),
            serde_json::json!("update")
        );
    }

    #[test]
    fn test_staleness() {
        let mut record = PendingRecord {
            tooling_id: 1,
            game_id: Some(7),
            action: PendingAction::Update,
            version: 3,
            approved: false,
            created_at: Utc::now(),
            live_version: Some(3),
            data: (),
        };
        assert!(!record.is_stale());
        record.live_version = Some(4);
        assert!(record.is_stale());
        record.live_version = None;
        assert!(!record.is_stale());
    }

    #[test]
    fn test_merge_report_shape() {
        let report = MergeReport {
            inserted: 2,
            updated: 1,
            skipped: vec![9],
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"inserted": 2, "updated": 1, "skipped": [9]})
        );
    }
}
