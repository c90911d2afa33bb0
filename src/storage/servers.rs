//! Game server instances and their population counts.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use tracing::info;

use super::postgres::{PostgresError, PostgresStore};

pub const SERVERS_CHANNEL: &str = "management_servers";

/// Lifetime of an instance created without an explicit end.
pub const DEFAULT_SERVER_LIFETIME_DAYS: i64 = 70;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServerInstance {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub character_count: i64,
    pub player_count: i64,
}

pub fn default_ends_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(DEFAULT_SERVER_LIFETIME_DAYS)
}

impl PostgresStore {
    pub async fn list_servers(&self) -> Result<Vec<ServerInstance>, PostgresError> {
        let rows = sqlx::query_as::<_, ServerInstance>(
            "SELECT s.id, s.name, s.created_at, s.ends_at,
                    COUNT(c.id) AS character_count,
                    COUNT(DISTINCT c.player_id) AS player_count
             FROM management.servers s
             LEFT JOIN game.characters c ON c.server_id = s.id
             GROUP BY s.id
             ORDER BY s.id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn create_server(
        &self,
        name: Option<&str>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<ServerInstance, PostgresError> {
        let created_at = Utc::now();
        let ends_at = ends_at.unwrap_or_else(|| default_ends_at(created_at));
        if ends_at <= created_at {
            return Err(PostgresError::validation("endsAt: must be in the future"));
        }
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let mut tx = self.begin().await?;
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO management.servers (name, created_at, ends_at)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(name)
        .bind(created_at)
        .bind(ends_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::notify(
            &mut tx,
            SERVERS_CHANNEL,
            &json!({
                "action": "created",
                "id": id,
                "name": name,
                "createdAt": created_at,
                "endsAt": ends_at,
            }),
        )
        .await;
        tx.commit().await?;

        info!("Created server instance {} (ends {})", id, ends_at);
        Ok(ServerInstance {
            id,
            name: name.map(str::to_string),
            created_at,
            ends_at,
            character_count: 0,
            player_count: 0,
        })
    }

    pub async fn delete_server(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM management.servers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("server {}", id)));
        }
        info!("Deleted server instance {}", id);
        Ok(())
    }
}
