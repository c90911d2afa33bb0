//! Effect catalogue, read-only here.

use serde::Serialize;
use sqlx::FromRow;

use super::postgres::{PostgresError, PostgresStore};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Effect {
    pub id: i32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PostgresStore {
    pub async fn list_effects(&self) -> Result<Vec<Effect>, PostgresError> {
        let rows = sqlx::query_as::<_, Effect>(
            "SELECT id, name, description FROM game.effects ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
