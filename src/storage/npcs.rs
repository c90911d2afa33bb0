//! Non-player characters.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::postgres::{PostgresError, PostgresStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered short traits.
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<i32>,
}

impl Npc {
    pub fn validate(&self) -> Result<(), PostgresError> {
        if self.name.trim().is_empty() {
            return Err(PostgresError::validation("name: must not be empty"));
        }
        if let Some(i) = self.personality.iter().position(|t| t.trim().is_empty()) {
            return Err(PostgresError::validation(format!(
                "personality[{}]: must not be empty",
                i
            )));
        }
        if let Some(i) = self.goals.iter().position(|g| g.trim().is_empty()) {
            return Err(PostgresError::validation(format!("goals[{}]: must not be empty", i)));
        }
        Ok(())
    }
}

impl PostgresStore {
    pub async fn list_npcs(&self) -> Result<Vec<Npc>, PostgresError> {
        let rows = sqlx::query_as::<_, Npc>(
            "SELECT id, name, context, role, personality, goals, settlement_id
             FROM game.npcs ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn save_npc(&self, npc: &Npc) -> Result<i32, PostgresError> {
        npc.validate()?;

        let id: Option<i32> = match npc.id {
            Some(id) => {
                sqlx::query_scalar(
                    "UPDATE game.npcs
                     SET name = $2, context = $3, role = $4, personality = $5, goals = $6,
                         settlement_id = $7
                     WHERE id = $1
                     RETURNING id",
                )
                .bind(id)
                .bind(&npc.name)
                .bind(&npc.context)
                .bind(&npc.role)
                .bind(&npc.personality)
                .bind(&npc.goals)
                .bind(npc.settlement_id)
                .fetch_optional(self.pool())
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "INSERT INTO game.npcs (name, context, role, personality, goals, settlement_id)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING id",
                )
                .bind(&npc.name)
                .bind(&npc.context)
                .bind(&npc.role)
                .bind(&npc.personality)
                .bind(&npc.goals)
                .bind(npc.settlement_id)
                .fetch_optional(self.pool())
                .await?
            }
        };

        let id = id.ok_or_else(|| {
            PostgresError::NotFound(format!("npc {}", npc.id.unwrap_or_default()))
        })?;
        info!("Saved npc {} ({})", id, npc.name);
        Ok(id)
    }

    pub async fn delete_npc(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM game.npcs WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("npc {}", id)));
        }
        info!("Deleted npc {}", id);
        Ok(())
    }
}
