//! Settlements: flat records with service flags, per-service art and
//! blessing references.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::postgres::{PostgresError, PostgresStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Absent on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "assetID",
        alias = "assetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub asset_id: Option<i32>,
    #[serde(default)]
    pub blacksmith: bool,
    #[serde(default)]
    pub alchemist: bool,
    #[serde(default)]
    pub enchanter: bool,
    #[serde(default)]
    pub trainer: bool,
    #[serde(default)]
    pub church: bool,
    #[serde(
        default,
        rename = "blacksmithAssetID",
        alias = "blacksmithAssetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub blacksmith_asset_id: Option<i32>,
    #[serde(
        default,
        rename = "alchemistAssetID",
        alias = "alchemistAssetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub alchemist_asset_id: Option<i32>,
    #[serde(
        default,
        rename = "enchanterAssetID",
        alias = "enchanterAssetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub enchanter_asset_id: Option<i32>,
    #[serde(
        default,
        rename = "trainerAssetID",
        alias = "trainerAssetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub trainer_asset_id: Option<i32>,
    #[serde(
        default,
        rename = "churchAssetID",
        alias = "churchAssetId",
        skip_serializing_if = "Option::is_none"
    )]
    pub church_asset_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blessing_1: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blessing_2: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blessing_3: Option<i32>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
}

impl Settlement {
    pub fn validate(&self) -> Result<(), PostgresError> {
        if self.name.trim().is_empty() {
            return Err(PostgresError::validation("name: must not be empty"));
        }
        if matches!(self.id, Some(id) if id <= 0) {
            return Err(PostgresError::validation("id: must be a positive id"));
        }
        Ok(())
    }
}

const SELECT_SETTLEMENTS: &str = "SELECT id, name, description, asset_id,
        blacksmith, alchemist, enchanter, trainer, church,
        blacksmith_asset_id, alchemist_asset_id, enchanter_asset_id, trainer_asset_id,
        church_asset_id, blessing_1, blessing_2, blessing_3
     FROM game.settlements ORDER BY id";

impl PostgresStore {
    pub async fn list_settlements(&self) -> Result<Vec<Settlement>, PostgresError> {
        let rows = sqlx::query_as::<_, Settlement>(SELECT_SETTLEMENTS)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    /// Insert when `id` is absent, otherwise overwrite that row.
    pub async fn save_settlement(&self, settlement: &Settlement) -> Result<i32, PostgresError> {
        settlement.validate()?;

        // $1 is bound in both forms; the insert ignores it.
        let sql = match settlement.id {
            Some(_) => {
                "UPDATE game.settlements
                 SET name = $2, description = $3, asset_id = $4,
                     blacksmith = $5, alchemist = $6, enchanter = $7, trainer = $8, church = $9,
                     blacksmith_asset_id = $10, alchemist_asset_id = $11, enchanter_asset_id = $12,
                     trainer_asset_id = $13, church_asset_id = $14,
                     blessing_1 = $15, blessing_2 = $16, blessing_3 = $17
                 WHERE id = $1
                 RETURNING id"
            }
            None => {
                "INSERT INTO game.settlements
                    (name, description, asset_id, blacksmith, alchemist, enchanter, trainer, church,
                     blacksmith_asset_id, alchemist_asset_id, enchanter_asset_id, trainer_asset_id,
                     church_asset_id, blessing_1, blessing_2, blessing_3)
                 VALUES ($2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                 RETURNING id"
            }
        };

        let id: Option<i32> = sqlx::query_scalar(sql)
            .bind(settlement.id)
            .bind(&settlement.name)
            .bind(&settlement.description)
            .bind(settlement.asset_id)
            .bind(settlement.blacksmith)
            .bind(settlement.alchemist)
            .bind(settlement.enchanter)
            .bind(settlement.trainer)
            .bind(settlement.church)
            .bind(settlement.blacksmith_asset_id)
            .bind(settlement.alchemist_asset_id)
            .bind(settlement.enchanter_asset_id)
            .bind(settlement.trainer_asset_id)
            .bind(settlement.church_asset_id)
            .bind(settlement.blessing_1)
            .bind(settlement.blessing_2)
            .bind(settlement.blessing_3)
            .fetch_optional(self.pool())
            .await?;

        let id = id.ok_or_else(|| {
            PostgresError::NotFound(format!("settlement {}", settlement.id.unwrap_or_default()))
        })?;
        info!("Saved settlement {} ({})", id, settlement.name);
        Ok(id)
    }

    pub async fn delete_settlement(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("DELETE FROM game.settlements WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("settlement {}", id)));
        }
        info!("Deleted settlement {}", id);
        Ok(())
    }
}
